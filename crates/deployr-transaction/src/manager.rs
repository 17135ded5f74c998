//! The transaction manager: dispatches API calls and classifies replies.
//!
//! This is the heart of the client. For every [`RequestDescriptor`] it:
//! - flattens the parameters into `key=value` pairs
//! - sends them through the [`HttpTransport`], or submits a bound
//!   [`UploadForm`] for uploads
//! - decides whether the transaction succeeded, looking at both the HTTP
//!   status and the envelope's own `success` flag
//! - hands the outcome to the caller's [`Callback`], then runs `notify`
//!
//! # Concurrency note
//!
//! Each dispatched transaction runs on its own tokio task and owns its
//! callback. The only state shared between transactions is the id
//! counter, the form registry and the event registration. The last two
//! sit behind `std::sync::Mutex` and are never locked across an
//! `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use deployr_protocol::{Codec, Format, JsonCodec, ResponseEnvelope};
use deployr_transport::{HttpReply, HttpRequest, HttpTransport, Method, TransportError, UploadForm};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::callback::{Callback, Completion};
use crate::config::TransactionConfig;
use crate::descriptor::{RequestDescriptor, query_string};
use crate::events::{EventRegistration, TransactionEvents};
use crate::failure::{DispatchError, Failure, FailureKind, Status, TransactionError};
use crate::response::Response;
use crate::state::{TransactionId, TransactionState};

/// Dispatches transactions against one DeployR server.
///
/// Cloning is cheap: clones share the transport, the form registry and the
/// event registration.
///
/// ## Lifecycle of a transaction
///
/// ```text
/// dispatch() ──→ [Created] ──→ [Dispatched] ──→ reply classified
///                                                   │
///                         ┌─────────────────────────┴──┐
///                         ▼                            ▼
///                 [CompletedSuccess]          [CompletedFailure]
///                    success()                    failure()
///                         └─────────────┬──────────────┘
///                                       ▼
///                              [Notified] notify()
///                                       ▼
///                                  [Terminal]
/// ```
pub struct TransactionManager<T: HttpTransport> {
    inner: Arc<ManagerState<T>>,
}

struct ManagerState<T> {
    transport: T,
    config: TransactionConfig,
    codec: JsonCodec,
    /// Forms captured for upload, keyed by form id. A binding is taken by
    /// the first upload that names it.
    forms: Mutex<HashMap<String, UploadForm>>,
    events: Mutex<EventRegistration>,
    next_id: AtomicU64,
}

/// A request ready to go out, with its transaction id assigned.
struct Prepared {
    id: TransactionId,
    request: HttpRequest,
    form: Option<UploadForm>,
    format: Format,
}

impl<T: HttpTransport> Clone for TransactionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: HttpTransport> TransactionManager<T> {
    pub fn new(transport: T, config: TransactionConfig) -> Self {
        Self {
            inner: Arc::new(ManagerState {
                transport,
                config,
                codec: JsonCodec,
                forms: Mutex::new(HashMap::new()),
                events: Mutex::new(EventRegistration::Unregistered),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.inner.config
    }

    // -----------------------------------------------------------------------
    // Form bindings
    // -----------------------------------------------------------------------

    /// Binds `form` under `form_id`, so the next upload naming that id
    /// submits it. Returns the binding it replaced, if any.
    pub fn bind_form(&self, form_id: impl Into<String>, form: UploadForm) -> Option<UploadForm> {
        let form_id = form_id.into();
        tracing::debug!(%form_id, file_name = %form.file_name, "form bound");
        self.forms().insert(form_id, form)
    }

    /// Removes the binding for `form_id` without uploading it.
    pub fn unbind_form(&self, form_id: &str) -> Option<UploadForm> {
        self.forms().remove(form_id)
    }

    pub fn is_form_bound(&self, form_id: &str) -> bool {
        self.forms().contains_key(form_id)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Registers the manager-wide event observer.
    ///
    /// Only the first call has an effect. Returns `false` if an observer
    /// was already registered, in which case `observer` is dropped.
    pub fn subscribe_events(&self, observer: impl TransactionEvents) -> bool {
        let mut registration = self.inner.events.lock().unwrap_or_else(PoisonError::into_inner);
        if registration.is_registered() {
            return false;
        }
        *registration = EventRegistration::Registered(Arc::new(observer));
        tracing::debug!("transaction events registered");
        true
    }

    pub fn events_registered(&self) -> bool {
        self.observer().is_some()
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Starts a transaction and returns immediately.
    ///
    /// The transaction runs on a new tokio task, so this must be called
    /// from within a runtime. `callback` is invoked from that task: one of
    /// its `success`/`failure` handlers, then `notify`.
    ///
    /// # Errors
    /// Returns [`DispatchError::FormNotBound`] if the descriptor is an
    /// upload whose form id has no binding. No transaction is created and
    /// no handler runs.
    pub fn dispatch(
        &self,
        descriptor: RequestDescriptor,
        callback: Callback,
    ) -> Result<TransactionHandle, DispatchError> {
        let prepared = self.prepare(descriptor)?;
        let id = prepared.id;
        let is_upload = prepared.form.is_some();

        let (state_tx, state_rx) = watch::channel(TransactionState::Created);
        let manager = self.clone();

        let join = tokio::spawn(async move {
            advance(&state_tx, true);
            let outcome = manager.run(prepared).await;

            let completion = Completion {
                transaction: id,
                succeeded: outcome.is_ok(),
                status: match &outcome {
                    Ok(_) if is_upload => Status::Unknown,
                    Ok(_) => Status::Http(200),
                    Err(failure) => failure.status,
                },
            };
            advance(&state_tx, completion.succeeded);

            callback.deliver(outcome, completion);
            advance(&state_tx, completion.succeeded);
            advance(&state_tx, completion.succeeded);
            completion
        });

        Ok(TransactionHandle {
            id,
            state: state_rx,
            join,
        })
    }

    /// Runs a transaction to completion and returns its outcome.
    ///
    /// Same classification as [`dispatch`](Self::dispatch), without
    /// callbacks.
    ///
    /// # Errors
    /// - [`TransactionError::Dispatch`] if the descriptor cannot be sent
    /// - [`TransactionError::Failed`] with the classified failure
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Response, TransactionError> {
        let prepared = self.prepare(descriptor)?;
        Ok(self.run(prepared).await?)
    }

    /// Builds the HTTP request and assigns the transaction id.
    fn prepare(&self, descriptor: RequestDescriptor) -> Result<Prepared, DispatchError> {
        let form = match &descriptor.form_id {
            Some(form_id) => Some(
                self.forms()
                    .remove(form_id)
                    .ok_or_else(|| DispatchError::FormNotBound(form_id.clone()))?,
            ),
            None => None,
        };

        let config = &self.inner.config;
        let method = if form.is_some() {
            Method::Post
        } else {
            descriptor.method
        };
        let pairs = descriptor.flattened(method);
        let mut uri = format!("{}{}", config.base_path, descriptor.path);

        let fields = if method == Method::Get {
            uri.push('?');
            uri.push_str(&query_string(&pairs));
            Vec::new()
        } else {
            pairs
        };

        let id = TransactionId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        Ok(Prepared {
            id,
            request: HttpRequest {
                method,
                uri,
                fields,
                timeout: config.timeout,
                cache: config.cache,
            },
            form,
            format: descriptor.format,
        })
    }

    /// Sends a prepared request and classifies the result.
    async fn run(&self, prepared: Prepared) -> Result<Response, Failure> {
        let Prepared {
            id,
            request,
            form,
            format,
        } = prepared;
        let observer = self.observer();
        if let Some(observer) = &observer {
            observer.start(id);
        }

        tracing::debug!(
            transaction = %id,
            method = %request.method,
            uri = %request.uri,
            fields = ?request.fields,
            upload = form.is_some(),
            "request input"
        );

        let outcome = match form {
            Some(form) => self.run_upload(id, request, form, observer.as_deref()).await,
            None => self.run_request(id, request, format, observer.as_deref()).await,
        };

        if let Err(failure) = &outcome {
            tracing::warn!(
                transaction = %id,
                kind = %failure.kind,
                status = %failure.status,
                "transaction failed: {}",
                failure.status_text
            );
        }
        outcome
    }

    async fn run_request(
        &self,
        id: TransactionId,
        request: HttpRequest,
        format: Format,
        observer: Option<&dyn TransactionEvents>,
    ) -> Result<Response, Failure> {
        match self.inner.transport.send(request).await {
            Ok(reply) => {
                tracing::debug!(
                    transaction = %id,
                    status = reply.status,
                    body_len = reply.body.len(),
                    "request output"
                );
                let status = Status::Http(reply.status);
                if let Some(observer) = observer {
                    observer.complete(id, &status);
                    if reply.is_ok() {
                        observer.success(id, &status);
                    } else {
                        observer.failure(id, &status);
                    }
                }
                self.classify(id, format, reply)
            }
            Err(err) => {
                if let Some(observer) = observer {
                    if matches!(err, TransportError::Timeout(_)) {
                        observer.abort(id);
                    }
                    observer.complete(id, &Status::NoResponse);
                    observer.failure(id, &Status::NoResponse);
                }
                Err(Failure::new(
                    id,
                    FailureKind::Transport,
                    Status::NoResponse,
                    err.to_string(),
                ))
            }
        }
    }

    async fn run_upload(
        &self,
        id: TransactionId,
        request: HttpRequest,
        form: UploadForm,
        observer: Option<&dyn TransactionEvents>,
    ) -> Result<Response, Failure> {
        match self.inner.transport.submit_form(request, form).await {
            Ok(body) => {
                tracing::debug!(transaction = %id, body_len = body.len(), "upload output");
                if let Some(observer) = observer {
                    observer.upload(id);
                }
                self.classify_upload(id, &body)
            }
            Err(err) => {
                if let (Some(observer), TransportError::Timeout(_)) = (observer, &err) {
                    observer.abort(id);
                }
                Err(Failure::new(
                    id,
                    FailureKind::Transport,
                    Status::NoResponse,
                    err.to_string(),
                ))
            }
        }
    }

    /// Decides the outcome of a plain request from its reply.
    fn classify(&self, id: TransactionId, format: Format, reply: HttpReply) -> Result<Response, Failure> {
        if !reply.is_ok() {
            return Err(Failure::new(
                id,
                FailureKind::Transport,
                Status::Http(reply.status),
                reply.status_text,
            ));
        }

        match format {
            Format::Text => Ok(Response::Text(reply.body)),
            Format::Json => {
                let envelope = self.parse_envelope(id, &reply.body, Status::Http(200))?;
                if envelope.is_success() {
                    Ok(Response::Json(envelope))
                } else {
                    Err(Failure::new(
                        id,
                        FailureKind::Application,
                        Status::Unknown,
                        envelope.error().unwrap_or_default(),
                    ))
                }
            }
        }
    }

    /// Decides the outcome of an upload from the body alone.
    fn classify_upload(&self, id: TransactionId, body: &str) -> Result<Response, Failure> {
        if body.is_empty() {
            return Err(Failure::new(
                id,
                FailureKind::Upload,
                Status::Unknown,
                "empty upload response",
            ));
        }
        self.parse_envelope(id, body, Status::Unknown)
            .map(Response::Json)
    }

    fn parse_envelope(
        &self,
        id: TransactionId,
        body: &str,
        status: Status,
    ) -> Result<ResponseEnvelope, Failure> {
        self.inner
            .codec
            .decode(body)
            .map_err(|err| Failure::new(id, FailureKind::Parse, status, err.to_string()))
    }

    fn forms(&self) -> MutexGuard<'_, HashMap<String, UploadForm>> {
        self.inner.forms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observer(&self) -> Option<Arc<dyn TransactionEvents>> {
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observer()
    }
}

/// Moves the watched state one step forward.
fn advance(state: &watch::Sender<TransactionState>, succeeded: bool) {
    state.send_modify(|current| {
        if let Some(next) = current.next(succeeded) {
            *current = next;
        }
    });
}

/// A dispatched transaction.
///
/// Dropping the handle does not cancel the transaction: it runs to
/// completion (or timeout) and its callback still fires.
#[derive(Debug)]
pub struct TransactionHandle {
    id: TransactionId,
    state: watch::Receiver<TransactionState>,
    join: JoinHandle<Completion>,
}

impl TransactionHandle {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> TransactionState {
        *self.state.borrow()
    }

    /// Waits until the transaction is [`Terminal`](TransactionState::Terminal),
    /// i.e. its handlers and `notify` have all run.
    ///
    /// Returns `None` if the runtime shut down first. If a handler panicked,
    /// the panic is resumed here.
    pub async fn wait(self) -> Option<Completion> {
        match self.join.await {
            Ok(completion) => Some(completion),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use super::*;

    /// Transport for tests that never send anything.
    struct Unreachable;

    impl HttpTransport for Unreachable {
        fn send(
            &self,
            _request: HttpRequest,
        ) -> impl Future<Output = Result<HttpReply, TransportError>> + Send {
            async { Err(TransportError::Connect("not under test".into())) }
        }

        fn submit_form(
            &self,
            _request: HttpRequest,
            _form: UploadForm,
        ) -> impl Future<Output = Result<String, TransportError>> + Send {
            async { Err(TransportError::Connect("not under test".into())) }
        }
    }

    fn manager() -> TransactionManager<Unreachable> {
        TransactionManager::new(Unreachable, TransactionConfig::default())
    }

    fn reply(status: u16, body: &str) -> HttpReply {
        HttpReply {
            status,
            status_text: if status == 200 { "OK" } else { "Internal Server Error" }.into(),
            body: body.into(),
        }
    }

    #[test]
    fn test_prepare_get_builds_query_string() {
        let prepared = manager()
            .prepare(RequestDescriptor::get("/r/session/ping").param("session", "LIVE 1"))
            .unwrap();
        assert_eq!(prepared.request.method, Method::Get);
        assert_eq!(
            prepared.request.uri,
            "/deployr/r/session/ping?session=LIVE%201&format=json"
        );
        assert!(prepared.request.fields.is_empty());
        assert!(!prepared.request.cache);
        assert_eq!(prepared.request.timeout, crate::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_prepare_post_keeps_fields_raw() {
        let prepared = manager()
            .prepare(RequestDescriptor::post("/r/session/execute/code").param("code", "x & y"))
            .unwrap();
        assert_eq!(prepared.request.uri, "/deployr/r/session/execute/code");
        assert_eq!(
            prepared.request.fields,
            vec![
                ("code".to_string(), "x & y".to_string()),
                ("format".to_string(), "json".to_string()),
            ]
        );
    }

    #[test]
    fn test_prepare_assigns_increasing_ids() {
        let manager = manager();
        let a = manager.prepare(RequestDescriptor::get("/a")).unwrap().id;
        let b = manager.prepare(RequestDescriptor::get("/b")).unwrap().id;
        assert!(b > a);
    }

    #[test]
    fn test_prepare_upload_requires_bound_form() {
        let manager = manager();
        let err = manager
            .prepare(RequestDescriptor::upload("/r/session/file/upload", "fileForm"))
            .err()
            .unwrap();
        assert_eq!(err, DispatchError::FormNotBound("fileForm".into()));
    }

    #[test]
    fn test_prepare_upload_takes_the_binding_and_forces_post() {
        let manager = manager();
        assert!(manager.bind_form("fileForm", UploadForm::new("a.csv", "1,2")).is_none());

        let mut descriptor = RequestDescriptor::upload("/r/session/file/upload", "fileForm")
            .param("session", "LIVE-1");
        descriptor.method = Method::Get;
        let prepared = manager.prepare(descriptor).unwrap();

        assert_eq!(prepared.request.method, Method::Post);
        assert_eq!(prepared.form.unwrap().file_name, "a.csv");
        assert_eq!(
            prepared.request.fields,
            vec![
                ("session".to_string(), "LIVE-1".to_string()),
                ("format".to_string(), "text".to_string()),
            ]
        );
        assert!(!manager.is_form_bound("fileForm"));
    }

    #[test]
    fn test_bind_form_replaces_and_unbind_removes() {
        let manager = manager();
        manager.bind_form("f", UploadForm::new("a", "1"));
        let previous = manager.bind_form("f", UploadForm::new("b", "2"));
        assert_eq!(previous.map(|form| form.file_name), Some("a".to_string()));
        assert_eq!(manager.unbind_form("f").map(|form| form.file_name), Some("b".to_string()));
        assert!(!manager.is_form_bound("f"));
    }

    #[test]
    fn test_classify_non_200_is_transport_failure_with_verbatim_status() {
        let failure = manager()
            .classify(TransactionId::new(1), Format::Json, reply(500, "not json"))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.status, Status::Http(500));
        assert_eq!(failure.status_text, "Internal Server Error");
    }

    #[test]
    fn test_classify_application_failure() {
        let body = r#"{"deployr":{"response":{"success":false,"call":"/x","error":"bad input"}}}"#;
        let failure = manager()
            .classify(TransactionId::new(1), Format::Json, reply(200, body))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Application);
        assert_eq!(failure.status, Status::Unknown);
        assert_eq!(failure.status_text, "bad input");
    }

    #[test]
    fn test_classify_malformed_json_is_parse_failure() {
        let failure = manager()
            .classify(TransactionId::new(1), Format::Json, reply(200, "<html>"))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Parse);
        assert_eq!(failure.status, Status::Http(200));
    }

    #[test]
    fn test_classify_text_passes_body_through() {
        let response = manager()
            .classify(TransactionId::new(1), Format::Text, reply(200, "a,b\n1,2"))
            .unwrap();
        assert_eq!(response, Response::Text("a,b\n1,2".into()));
    }

    #[test]
    fn test_classify_upload() {
        let manager = manager();
        let id = TransactionId::new(1);

        let failure = manager.classify_upload(id, "  ").unwrap_err();
        assert_eq!(failure.kind, FailureKind::Upload);

        let failure = manager.classify_upload(id, "oops").unwrap_err();
        assert_eq!(failure.kind, FailureKind::Parse);

        let body = r#"{"deployr":{"response":{"success":true,"call":"/u","file":{"filename":"a.csv"}}}}"#;
        let response = manager.classify_upload(id, body).unwrap();
        assert!(response.field("file").is_some());
    }

    #[test]
    fn test_subscribe_events_only_once() {
        struct Quiet;
        impl TransactionEvents for Quiet {}

        let manager = manager();
        assert!(!manager.events_registered());
        assert!(manager.subscribe_events(Quiet));
        assert!(!manager.subscribe_events(Quiet));
        assert!(manager.clone().events_registered());
    }
}
