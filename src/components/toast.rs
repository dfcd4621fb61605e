use gloo_timers::callback::Timeout;
use leptos::prelude::*;

/// How long a toast stays up.
pub const TOAST_MS: u32 = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
	Success,
	Error,
	Info,
}

impl ToastKind {
	fn class(self) -> &'static str {
		match self {
			ToastKind::Success => "toast toast-success",
			ToastKind::Error => "toast toast-error",
			ToastKind::Info => "toast toast-info",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
	pub id: u64,
	pub kind: ToastKind,
	pub message: String,
}

/// App-wide toast list, provided as context by `App`.
#[derive(Clone, Copy)]
pub struct NotificationState {
	pub toasts: RwSignal<Vec<Toast>>,
	next_id: StoredValue<u64>,
}

impl Default for NotificationState {
	fn default() -> Self {
		Self::new()
	}
}

impl NotificationState {
	pub fn new() -> Self {
		Self {
			toasts: RwSignal::new(Vec::new()),
			next_id: StoredValue::new(0),
		}
	}

	/// Shows `message` and schedules its removal.
	pub fn add(&self, kind: ToastKind, message: impl Into<String>) -> u64 {
		let id = self.next_id.get_value() + 1;
		self.next_id.set_value(id);
		self.toasts.update(|list| {
			list.push(Toast {
				id,
				kind,
				message: message.into(),
			})
		});
		let this = *self;
		Timeout::new(TOAST_MS, move || this.remove(id)).forget();
		id
	}

	pub fn remove(&self, id: u64) {
		// the owner may already be gone when a timer fires late
		let _ = self.toasts.try_update(|list| list.retain(|t| t.id != id));
	}

	pub fn success(&self, message: impl Into<String>) {
		self.add(ToastKind::Success, message);
	}

	pub fn error(&self, message: impl Into<String>) {
		let message = message.into();
		log::error!("{message}");
		self.add(ToastKind::Error, message);
	}

	pub fn info(&self, message: impl Into<String>) {
		self.add(ToastKind::Info, message);
	}
}

pub fn provide_notifications() {
	provide_context(NotificationState::new());
}

pub fn use_notifications() -> NotificationState {
	expect_context::<NotificationState>()
}

#[component]
pub fn ToastContainer() -> impl IntoView {
	let state = use_notifications();

	view! {
		<div class="toast-container" aria-live="polite">
			<For each=move || state.toasts.get() key=|t| t.id let:toast>
				<div class=toast.kind.class() role="alert">
					<span class="toast-message">{toast.message.clone()}</span>
					<button class="toast-close" aria-label="Close" on:click=move |_| state.remove(toast.id)>
						"×"
					</button>
				</div>
			</For>
		</div>
	}
}
