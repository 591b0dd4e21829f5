//! Incremental analysis of a document on the worker pool.
//!
//! Every committed transaction starts a parse episode for the new tail of
//! the document's edit chain. Starting an episode supersedes the one in
//! flight: its token is cancelled and its generation stops being current.
//!
//! # Install protocol
//!
//! One lock guards the in-flight token and the published data. An episode
//! reads the document's tail while holding it, so the newest episode always
//! covers the newest commit. Parse bodies run without it. A finished episode
//! takes the lock once and publishes only if its generation is still the
//! in-flight one, so a slow episode that finishes after a newer one can
//! never overwrite newer results.
//!
//! Installs pass through a second lock, taken before the state lock and
//! held while data-changed observers run. Observers therefore see installs
//! one at a time, in generation order.


use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};
use weft_document::{Document, DocumentId, Observers, SubscriptionId};
use weft_primitives::EditDescriptor;
use weft_worker::{GenerationClock, GenerationToken, TaskClass};

use crate::annotations::{FormatData, FormatSpan, LineFormat};
use crate::metrics::{AnalyzerMetrics, AnalyzerStats};
use crate::parser::LineParser;

type DataChangedCallback = dyn Fn(&FormatData) + Send + Sync;

#[derive(Debug, Default)]
struct AnalyzerState {
	in_flight: Option<GenerationToken>,
	published: Option<FormatData>,
	started: bool,
	disposed: bool,
}

struct Inner {
	document: Document,
	id: DocumentId,
	parser: Arc<dyn LineParser>,
	clock: GenerationClock,
	state: Mutex<AnalyzerState>,
	/// Serializes installs and their observer delivery.
	delivery: Mutex<()>,
	data_changed: Observers<DataChangedCallback>,
	metrics: AnalyzerMetrics,
}

impl Inner {
	/// Starts an episode for the document's current tail, superseding the
	/// one in flight.
	fn start_episode(self: &Arc<Self>) {
		let (token, change) = {
			let mut state = self.state.lock();
			if state.disposed {
				return;
			}
			let change = self.document.last_change();
			let token = self.clock.issue();
			if let Some(previous) = state.in_flight.replace(token.clone()) {
				previous.cancel();
				trace!(document = self.id.0, superseded = previous.generation(), "analyzer.superseded");
			}
			state.started = true;
			(token, change)
		};
		self.metrics.record_started();
		debug!(
			document = self.id.0,
			parser = self.parser.name(),
			generation = token.generation(),
			version = change.new_snapshot().version(),
			"analyzer.episode_start"
		);

		let inner = Arc::clone(self);
		// Detached: the result reaches readers through `install`.
		drop(weft_worker::spawn_blocking(TaskClass::Analysis, move || inner.run_episode(token, change)));
	}

	fn run_episode(&self, token: GenerationToken, change: Arc<EditDescriptor>) {
		let started = Instant::now();
		match self.parser.parse(change.new_snapshot(), &token) {
			Some(spans) => {
				self.install(token.generation(), change, spans, started.elapsed());
			}
			None => {
				self.metrics.record_cancelled();
				trace!(document = self.id.0, generation = token.generation(), "analyzer.episode_cancelled");
			}
		}
	}

	/// Publishes `spans` if `generation` is still the in-flight episode.
	fn install(&self, generation: u64, as_of: Arc<EditDescriptor>, spans: Vec<FormatSpan>, elapsed: Duration) -> bool {
		let _delivery = self.delivery.lock();
		let data = {
			let mut state = self.state.lock();
			let current = !state.disposed
				&& state
					.in_flight
					.as_ref()
					.is_some_and(|token| token.generation() == generation);
			if !current {
				drop(state);
				self.metrics.record_stale();
				debug!(document = self.id.0, generation, "analyzer.stale_discarded");
				return false;
			}
			state.in_flight = None;
			let data = FormatData::new(spans, as_of, generation);
			state.published = Some(data.clone());
			data
		};

		self.metrics.record_installed(elapsed);
		debug!(
			document = self.id.0,
			generation,
			spans = data.len(),
			elapsed_us = elapsed.as_micros() as u64,
			"analyzer.installed"
		);
		self.data_changed.for_each(|observer| observer(&data));
		true
	}
}

/// Background analyzer bound to one document.
///
/// Dropping it (or calling [`unregister`](Self::unregister)) stops
/// listening and cancels the in-flight episode.
pub struct IncrementalAnalyzer {
	inner: Arc<Inner>,
	subscription: Option<SubscriptionId>,
}

impl IncrementalAnalyzer {
	/// Subscribes `parser` to `document`.
	///
	/// Nothing is parsed until the first commit or the first
	/// [`get_format_data_for_line`](Self::get_format_data_for_line).
	pub fn register(document: &Document, parser: Arc<dyn LineParser>) -> Self {
		let inner = Arc::new(Inner {
			document: document.clone(),
			id: document.id(),
			parser,
			clock: GenerationClock::new(),
			state: Mutex::new(AnalyzerState::default()),
			delivery: Mutex::new(()),
			data_changed: Observers::new(),
			metrics: AnalyzerMetrics::default(),
		});
		let weak = Arc::downgrade(&inner);
		let subscription = document.subscribe(move |_| {
			if let Some(inner) = weak.upgrade() {
				inner.start_episode();
			}
		});
		debug!(document = document.id().0, parser = inner.parser.name(), "analyzer.register");
		Self {
			inner,
			subscription: Some(subscription),
		}
	}

	pub fn document(&self) -> &Document {
		&self.inner.document
	}

	pub fn parser_name(&self) -> &str {
		self.inner.parser.name()
	}

	/// Best-known annotations for `line`, or `None` before the first install.
	///
	/// Starts an episode if none ever ran. The returned spans are valid as
	/// of [`LineFormat::as_of`]; remap them to read them against a newer
	/// snapshot.
	pub fn get_format_data_for_line(&self, line: usize) -> Option<LineFormat> {
		let (published, needs_start) = {
			let state = self.inner.state.lock();
			(state.published.clone(), !state.started && !state.disposed)
		};
		if needs_start {
			self.inner.start_episode();
		}
		published.map(|data| data.for_line(line))
	}

	/// Last published data, without starting anything.
	pub fn format_data(&self) -> Option<FormatData> {
		self.inner.state.lock().published.clone()
	}

	/// Starts a fresh episode for the document's current tail.
	pub fn reanalyze(&self) {
		self.inner.start_episode();
	}

	/// True while an episode is in flight.
	pub fn is_busy(&self) -> bool {
		self.inner.state.lock().in_flight.is_some()
	}

	pub fn stats(&self) -> AnalyzerStats {
		self.inner.metrics.snapshot()
	}

	/// Subscribes to installs. Callbacks run on the worker thread that
	/// installed the data.
	pub fn on_data_changed(&self, observer: impl Fn(&FormatData) + Send + Sync + 'static) -> SubscriptionId {
		self.inner.data_changed.subscribe(Arc::new(observer))
	}

	pub fn remove_data_changed(&self, id: SubscriptionId) -> bool {
		self.inner.data_changed.unsubscribe(id)
	}

	pub fn is_registered(&self) -> bool {
		self.subscription.is_some()
	}

	/// Stops listening to the document and cancels the in-flight episode.
	pub fn unregister(&mut self) {
		let Some(id) = self.subscription.take() else {
			return;
		};
		self.inner.document.unsubscribe(id);
		let in_flight = {
			let mut state = self.inner.state.lock();
			state.disposed = true;
			state.in_flight.take()
		};
		if let Some(token) = in_flight {
			token.cancel();
		}
		debug!(document = self.inner.id.0, parser = self.inner.parser.name(), "analyzer.unregister");
	}
}

impl Drop for IncrementalAnalyzer {
	fn drop(&mut self) {
		self.unregister();
	}
}

impl fmt::Debug for IncrementalAnalyzer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("IncrementalAnalyzer")
			.field("document", &self.inner.id)
			.field("parser", &self.inner.parser.name())
			.field("in_flight", &state.in_flight.as_ref().map(GenerationToken::generation))
			.field("published", &state.published.as_ref().map(FormatData::generation))
			.field("registered", &self.subscription.is_some())
			.finish()
	}
}
