//! Mapping mutation outcomes onto user notifications.
//!
//! Mutations return plain `Result`s, a screen passes them through [`notify`] (or wraps the whole
//! call in [`with_feedback`]) to show the usual loading / success / error messages.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use dashboard_http_error::ApiError;

/// Shows transient messages to the user, e.g. toasts.
pub trait Notifier {
    /// An operation started. Ignored by default.
    fn loading(&self, _message: &str) {}

    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn loading(&self, message: &str) {
        N::loading(self, message)
    }

    fn success(&self, message: &str) {
        N::success(self, message)
    }

    fn error(&self, message: &str) {
        N::error(self, message)
    }
}

/// Messages for the three phases of a mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub loading: String,
    pub success: String,
    /// Prefix of the error notification, the [`ApiError`] message follows it.
    pub error: String,
}

impl Feedback {
    pub fn new(
        loading: impl Into<String>,
        success: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            loading: loading.into(),
            success: success.into(),
            error: error.into(),
        }
    }

    /// The error notification for `err`.
    pub fn error_message(&self, err: &ApiError) -> String {
        if self.error.is_empty() {
            err.message.clone()
        } else {
            format!("{}: {}", self.error, err.message)
        }
    }
}

/// Report the outcome of an operation and pass it on unchanged.
pub fn notify<T, N>(result: Result<T, ApiError>, feedback: &Feedback, notifier: &N) -> Result<T, ApiError>
where
    N: Notifier + ?Sized,
{
    match &result {
        Ok(_) => notifier.success(&feedback.success),
        Err(err) => notifier.error(&feedback.error_message(err)),
    }
    result
}

/// Report `loading`, run `operation` and report its outcome.
pub async fn with_feedback<T, F, N>(
    operation: F,
    feedback: &Feedback,
    notifier: &N,
) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
    N: Notifier + ?Sized,
{
    notifier.loading(&feedback.loading);
    notify(operation.await, feedback, notifier)
}

/// Sends notifications to the log, for headless use.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn loading(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn success(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Loading(String),
    Success(String),
    Error(String),
}

/// Collects notifications instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, notification: Notification) {
        self.lock().push(notification);
    }
}

impl Notifier for RecordingNotifier {
    fn loading(&self, message: &str) {
        self.push(Notification::Loading(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback() -> Feedback {
        Feedback::new("Saving course...", "Course saved", "Could not save course")
    }

    #[test]
    fn results_pass_through() {
        let notifier = RecordingNotifier::new();

        assert_eq!(notify(Ok(5), &feedback(), &notifier), Ok(5));
        let err = notify::<(), _>(Err(ApiError::new(422, "title is required")), &feedback(), &notifier)
            .unwrap_err();
        assert_eq!(err.status, 422);

        assert_eq!(
            notifier.take(),
            vec![
                Notification::Success("Course saved".into()),
                Notification::Error("Could not save course: title is required".into()),
            ]
        );
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn empty_error_prefix() {
        let feedback = Feedback::new("", "", "");
        assert_eq!(feedback.error_message(&ApiError::transport("reset")), "request failed: reset");
    }

    #[tokio::test]
    async fn loading_comes_first() {
        let notifier = RecordingNotifier::new();
        let result = with_feedback(async { Ok::<_, ApiError>("id") }, &feedback(), &notifier).await;
        assert_eq!(result, Ok("id"));
        assert_eq!(
            notifier.notifications(),
            vec![
                Notification::Loading("Saving course...".into()),
                Notification::Success("Course saved".into()),
            ]
        );
    }
}
