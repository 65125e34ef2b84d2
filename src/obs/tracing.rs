// self
use crate::{_prelude::*, auth::InstallationId, license::LicenseStatus, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapping one credential flow.
///
/// Every span declares the credential fields up front (`installation`, `pool_index`,
/// `exhausted`, `license_status`) and leaves them empty; the flow fills in whichever apply
/// once it knows them.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"tick_credentials.flow",
				flow = kind.as_str(),
				stage,
				installation = tracing::field::Empty,
				pool_index = tracing::field::Empty,
				exhausted = tracing::field::Empty,
				license_status = tracing::field::Empty,
			);

			Self { kind, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self { kind }
		}
	}

	/// Opens an installation-token span already tagged with the installation id.
	pub fn for_installation(installation: InstallationId, stage: &'static str) -> Self {
		let span = Self::new(FlowKind::Installation, stage);

		span.record_installation(installation);

		span
	}

	/// Flow this span belongs to.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Tags the span with the installation being exchanged.
	pub fn record_installation(&self, installation: InstallationId) {
		#[cfg(feature = "tracing")]
		self.span.record("installation", installation.get());
		#[cfg(not(feature = "tracing"))]
		let _ = installation;
	}

	/// Tags the span with the pool slot a rotation settled on.
	pub fn record_pool_slot(&self, index: usize, exhausted: bool) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("pool_index", index);
			self.span.record("exhausted", exhausted);
		}
		#[cfg(not(feature = "tracing"))]
		let _ = (index, exhausted);
	}

	/// Tags the span with the final license status.
	pub fn record_license_status(&self, status: LicenseStatus) {
		#[cfg(feature = "tracing")]
		self.span.record("license_status", status.as_str());
		#[cfg(not(feature = "tracing"))]
		let _ = status;
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> FlowSpanGuard {
		#[cfg(feature = "tracing")]
		{
			FlowSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			FlowSpanGuard {}
		}
	}

	/// Instruments an async flow without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`FlowSpan::entered`].
pub struct FlowSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}
