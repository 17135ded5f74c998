//! `DeployrClient` builder and the per-resource operations.
//!
//! Every operation here is a thin layer over the transaction manager: it
//! picks the endpoint, fills in the parameters, and (for operations with a
//! natural answer) narrows the reply unless the callback is `verbose`.

use std::time::Duration;

use deployr_protocol::Format;
use deployr_transaction::{
    Callback, Completion, RequestDescriptor, TransactionConfig, TransactionError, TransactionEvents,
    TransactionHandle, TransactionManager,
};
use deployr_transport::{HttpTransport, ReqwestTransport, UploadForm};
use serde_json::{Value, json};

use crate::credentials::hash_password;
use crate::endpoints;
use crate::options::{ExecOptions, inputs_param};
use crate::reply::{Reply, SessionFile, field_or, narrowed, session_files, string_field};
use crate::DeployrError;

/// Server root used when the builder is not given one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Builder for configuring a [`DeployrClient`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use deployr::prelude::*;
///
/// # fn run() -> Result<(), DeployrError> {
/// let client = DeployrClient::builder()
///     .base_url("http://deployr.example.com:8000")
///     .timeout(Duration::from_secs(60))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeployrClientBuilder {
    base_url: String,
    config: TransactionConfig,
}

impl DeployrClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            config: TransactionConfig::default(),
        }
    }

    /// Sets the server root, e.g. `http://localhost:8000`.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Sets the path prefix of the API (default `/deployr`).
    pub fn base_path(mut self, path: &str) -> Self {
        self.config.base_path = path.to_string();
        self
    }

    /// Sets the client-side timeout of every transaction.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the whole transaction configuration.
    pub fn transaction_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    /// Returns [`DeployrError::Transport`] if the HTTP client cannot be
    /// created.
    pub fn build(self) -> Result<DeployrClient<ReqwestTransport>, DeployrError> {
        let transport = ReqwestTransport::new(&self.base_url)?;
        Ok(self.with_transport(transport))
    }

    /// Builds a client on a caller-supplied transport. The base URL is
    /// ignored: the transport decides where requests go.
    pub fn with_transport<T: HttpTransport>(self, transport: T) -> DeployrClient<T> {
        tracing::debug!(base_path = %self.config.base_path, "deployr client created");
        DeployrClient {
            manager: TransactionManager::new(transport, self.config),
        }
    }
}

impl Default for DeployrClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for one DeployR server.
///
/// Operations return as soon as the request is dispatched. The outcome
/// reaches the callback; the returned [`TransactionHandle`] can be
/// awaited to know when the callback has run.
///
/// Operations with a natural answer take a `Callback<Reply<T>>`: the
/// `success` handler gets [`Reply::Brief`] with that answer, or
/// [`Reply::Full`] with the whole reply if the callback is `verbose`.
/// The rest take a plain [`Callback`] and always get the whole reply.
pub struct DeployrClient<T: HttpTransport> {
    manager: TransactionManager<T>,
}

impl<T: HttpTransport> Clone for DeployrClient<T> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
        }
    }
}

impl DeployrClient<ReqwestTransport> {
    /// Creates a new builder.
    pub fn builder() -> DeployrClientBuilder {
        DeployrClientBuilder::new()
    }
}

impl<T: HttpTransport> DeployrClient<T> {
    /// The underlying transaction manager, for awaiting requests directly
    /// with [`TransactionManager::execute`].
    pub fn manager(&self) -> &TransactionManager<T> {
        &self.manager
    }

    /// Captures `form` for the next upload naming `form_id`.
    pub fn bind_form(&self, form_id: &str, form: UploadForm) -> Option<UploadForm> {
        self.manager.bind_form(form_id, form)
    }

    /// Registers the client-wide event observer. Only the first call has
    /// an effect.
    pub fn subscribe_events(&self, observer: impl TransactionEvents) -> bool {
        self.manager.subscribe_events(observer)
    }

    fn send(
        &self,
        descriptor: RequestDescriptor,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        Ok(self.manager.dispatch(descriptor, callback)?)
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Creates a new R session. Brief reply: the session id.
    pub fn create_session(
        &self,
        callback: Callback<Reply<String>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::CREATE),
            narrowed(callback, |response| string_field(response, "session")),
        )
    }

    /// Closes a session. Brief reply: an empty string, the session the
    /// client now holds.
    pub fn close_session(
        &self,
        session: &str,
        callback: Callback<Reply<String>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::CLOSE).param("session", session),
            narrowed(callback, |_| String::new()),
        )
    }

    /// Checks that a session is alive. Brief reply: `true`.
    pub fn ping_session(
        &self,
        session: &str,
        callback: Callback<Reply<bool>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::session::PING).param("session", session),
            narrowed(callback, |_| true),
        )
    }

    /// Runs a block of R code in a session.
    pub fn execute_code(
        &self,
        session: &str,
        code: &str,
        options: &ExecOptions,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::EXECUTE_CODE)
                .param("session", session)
                .param("code", code)
                .param("robjects", options.robjects_param())
                .param("files", options.files_param()),
            callback,
        )
    }

    /// Runs a repository script in a session.
    ///
    /// # Errors
    /// Returns [`DeployrError::Protocol`] if the inputs cannot be encoded.
    pub fn execute_session_script(
        &self,
        session: &str,
        script: &str,
        options: &ExecOptions,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        let descriptor = script_descriptor(endpoints::session::EXECUTE_SCRIPT, script, options)?
            .param("session", session);
        self.send(descriptor, callback)
    }

    /// Brief reply: the `console` output (default `{}`).
    pub fn session_output(
        &self,
        session: &str,
        callback: Callback<Reply<Value>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::session::OUTPUT).param("session", session),
            narrowed(callback, |response| field_or(response, "console", json!({}))),
        )
    }

    /// Brief reply: the `history` (default `[]`).
    pub fn session_history(
        &self,
        session: &str,
        callback: Callback<Reply<Value>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::session::HISTORY).param("session", session),
            narrowed(callback, |response| field_or(response, "history", json!([]))),
        )
    }

    /// Saves the session workspace to the repository. Brief reply: the
    /// saved `objects` (default `{}`).
    pub fn save_workspace(
        &self,
        session: &str,
        descr: Option<&str>,
        callback: Callback<Reply<Value>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::SAVE_WORKSPACE)
                .param("session", session)
                .param("descr", descr.unwrap_or_default()),
            narrowed(callback, |response| field_or(response, "objects", json!({}))),
        )
    }

    /// Saves the session as a project. Brief reply: the `projects`
    /// (default `{}`).
    pub fn save_project(
        &self,
        session: &str,
        descr: Option<&str>,
        callback: Callback<Reply<Value>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::SAVE_PROJECT)
                .param("session", session)
                .param("descr", descr.unwrap_or_default()),
            narrowed(callback, |response| field_or(response, "projects", json!({}))),
        )
    }

    /// Logs in, then creates a session once the login succeeded.
    ///
    /// `callback` receives the outcome of the session creation, exactly as
    /// with [`create_session`](Self::create_session). If the login fails,
    /// the failure goes to `callback` instead (followed by `notify`) and is
    /// also returned.
    pub async fn login_create_session(
        &self,
        username: &str,
        password: &str,
        autosave: bool,
        callback: Callback<Reply<String>>,
    ) -> Result<TransactionHandle, DeployrError> {
        match self.manager.execute(login_descriptor(username, password, autosave)).await {
            Ok(_) => self.create_session(callback),
            Err(TransactionError::Failed(failure)) => {
                let completion = Completion {
                    transaction: failure.transaction,
                    succeeded: false,
                    status: failure.status,
                };
                callback.deliver(Err(failure.clone()), completion);
                Err(failure.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Session objects
    // -----------------------------------------------------------------------

    /// Lists the R objects in a session, optionally filtered by type.
    pub fn list_session_objects(
        &self,
        session: &str,
        filter: Option<&str>,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        let filter = filter.map_or(Value::Bool(false), Value::from);
        self.send(
            RequestDescriptor::get(endpoints::session::object::LIST)
                .param("session", session)
                .param("filter", filter),
            callback,
        )
    }

    /// Fetches one R object, optionally a slice of it.
    pub fn get_session_object(
        &self,
        session: &str,
        name: &str,
        start: Option<u64>,
        length: Option<u64>,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::session::object::GET)
                .param("session", session)
                .param("name", name)
                .param("start", optional_number(start))
                .param("length", optional_number(length)),
            callback,
        )
    }

    /// Pushes native values into a session as R objects. Brief reply: the
    /// session id.
    ///
    /// # Errors
    /// Returns [`DeployrError::Protocol`] if the inputs cannot be encoded.
    pub fn push_session_object(
        &self,
        session: &str,
        inputs: &Value,
        callback: Callback<Reply<String>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::object::PUSH)
                .param("session", session)
                .param("inputs", inputs_param(Some(inputs))?),
            narrowed(callback, |response| string_field(response, "session")),
        )
    }

    /// Uploads the form bound under `form_id` as an R object named `name`.
    pub fn upload_session_object(
        &self,
        form_id: &str,
        name: &str,
        session: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::upload(endpoints::session::object::UPLOAD, form_id)
                .param("name", name)
                .param("session", session),
            callback,
        )
    }

    pub fn delete_session_object(
        &self,
        session: &str,
        name: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::object::DELETE)
                .param("session", session)
                .param("name", name),
            callback,
        )
    }

    /// Stores a session object in the repository.
    pub fn save_session_object(
        &self,
        session: &str,
        name: &str,
        descr: Option<&str>,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::object::SAVE)
                .param("session", session)
                .param("name", name)
                .param("descr", descr.unwrap_or_default()),
            callback,
        )
    }

    /// Loads a repository object into a session.
    pub fn load_session_object(
        &self,
        session: &str,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::object::LOAD)
                .param("session", session)
                .param("id", id),
            callback,
        )
    }

    // -----------------------------------------------------------------------
    // Session files
    // -----------------------------------------------------------------------

    /// Brief reply: the files in the session's working directory.
    pub fn list_session_files(
        &self,
        session: &str,
        callback: Callback<Reply<Vec<SessionFile>>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::session::file::LIST).param("session", session),
            narrowed(callback, session_files),
        )
    }

    /// Uploads the form bound under `form_id` into the session's working
    /// directory as `name`. Brief reply: the uploaded file.
    pub fn upload_session_file(
        &self,
        form_id: &str,
        name: &str,
        session: &str,
        callback: Callback<Reply<Vec<SessionFile>>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::upload(endpoints::session::file::UPLOAD, form_id)
                .param("name", name)
                .param("session", session),
            narrowed(callback, session_files),
        )
    }

    /// Downloads a working-directory file. The reply is
    /// [`Response::Text`](deployr_transaction::Response::Text) with the
    /// file contents.
    pub fn download_session_file(
        &self,
        session: &str,
        name: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::session::file::DOWNLOAD)
                .param("name", name)
                .param("session", session)
                .format(Format::Text),
            callback,
        )
    }

    pub fn delete_session_file(
        &self,
        session: &str,
        name: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::file::DELETE)
                .param("name", name)
                .param("session", session),
            callback,
        )
    }

    /// Stores a working-directory file in the repository.
    pub fn save_session_file(
        &self,
        session: &str,
        name: &str,
        descr: Option<&str>,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::file::SAVE)
                .param("session", session)
                .param("name", name)
                .param("descr", descr.unwrap_or_default()),
            callback,
        )
    }

    /// Copies a repository file into the session's working directory.
    pub fn load_session_file(
        &self,
        session: &str,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::session::file::LOAD)
                .param("session", session)
                .param("id", id),
            callback,
        )
    }

    // -----------------------------------------------------------------------
    // Repository
    // -----------------------------------------------------------------------

    pub fn list_repo_objects(&self, callback: Callback) -> Result<TransactionHandle, DeployrError> {
        self.send(RequestDescriptor::get(endpoints::repository::object::LIST), callback)
    }

    pub fn upload_repo_object(
        &self,
        form_id: &str,
        name: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::upload(endpoints::repository::object::UPLOAD, form_id)
                .param("name", name),
            callback,
        )
    }

    pub fn download_repo_object(
        &self,
        name: &str,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::repository::object::DOWNLOAD)
                .param("name", name)
                .param("id", id)
                .format(Format::Text),
            callback,
        )
    }

    pub fn delete_repo_object(
        &self,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::repository::object::DELETE).param("id", id),
            callback,
        )
    }

    pub fn list_repo_files(&self, callback: Callback) -> Result<TransactionHandle, DeployrError> {
        self.send(RequestDescriptor::get(endpoints::repository::file::LIST), callback)
    }

    pub fn upload_repo_file(
        &self,
        form_id: &str,
        name: &str,
        session: Option<&str>,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::upload(endpoints::repository::file::UPLOAD, form_id)
                .param("name", name)
                .param("session", session),
            callback,
        )
    }

    pub fn download_repo_file(
        &self,
        name: &str,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::repository::file::DOWNLOAD)
                .param("name", name)
                .param("id", id)
                .format(Format::Text),
            callback,
        )
    }

    pub fn delete_repo_file(
        &self,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::repository::file::DELETE).param("id", id),
            callback,
        )
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn list_projects(&self, callback: Callback) -> Result<TransactionHandle, DeployrError> {
        self.send(RequestDescriptor::get(endpoints::project::LIST), callback)
    }

    pub fn load_project(
        &self,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::project::LOAD).param("id", id),
            callback,
        )
    }

    pub fn project_artifacts(
        &self,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::project::ARTIFACTS).param("id", id),
            callback,
        )
    }

    pub fn delete_project(
        &self,
        id: &str,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::project::DELETE).param("id", id),
            callback,
        )
    }

    // -----------------------------------------------------------------------
    // User
    // -----------------------------------------------------------------------

    /// Logs in. The password is sent as its SHA-1 hex digest.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        autosave: bool,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(login_descriptor(username, password, autosave), callback)
    }

    /// Brief reply: the envelope's `success` flag.
    pub fn logout(&self, callback: Callback<Reply<bool>>) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::user::LOGOUT),
            narrowed(callback, |response| {
                response.envelope().is_some_and(|envelope| envelope.is_success())
            }),
        )
    }

    pub fn whoami(&self, callback: Callback) -> Result<TransactionHandle, DeployrError> {
        self.send(RequestDescriptor::get(endpoints::user::WHOAMI), callback)
    }

    /// Turns automatic saving of the user's sessions on or off.
    pub fn autosave(
        &self,
        save: bool,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::post(endpoints::user::AUTOSAVE).param("save", save),
            callback,
        )
    }

    /// Brief reply: the user's `live` sessions (default `[]`).
    pub fn live_sessions(
        &self,
        callback: Callback<Reply<Value>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::user::LIVE),
            narrowed(callback, |response| field_or(response, "live", json!([]))),
        )
    }

    // -----------------------------------------------------------------------
    // Scripts
    // -----------------------------------------------------------------------

    /// Brief reply: the `scripts` (default `{}`).
    pub fn list_scripts(
        &self,
        callback: Callback<Reply<Value>>,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            RequestDescriptor::get(endpoints::script::LIST),
            narrowed(callback, |response| field_or(response, "scripts", json!({}))),
        )
    }

    /// Runs a repository script in a fresh, temporary session.
    ///
    /// # Errors
    /// Returns [`DeployrError::Protocol`] if the inputs cannot be encoded.
    pub fn execute_script(
        &self,
        script: &str,
        options: &ExecOptions,
        callback: Callback,
    ) -> Result<TransactionHandle, DeployrError> {
        self.send(
            script_descriptor(endpoints::script::EXECUTE, script, options)?,
            callback,
        )
    }
}

fn login_descriptor(username: &str, password: &str, autosave: bool) -> RequestDescriptor {
    RequestDescriptor::post(endpoints::user::LOGIN)
        .param("autosave", autosave)
        .param("username", username)
        .param("password", hash_password(password))
}

fn script_descriptor(
    path: &str,
    script: &str,
    options: &ExecOptions,
) -> Result<RequestDescriptor, DeployrError> {
    Ok(RequestDescriptor::post(path)
        .param("rscript", script)
        .param("preload", options.preload.as_deref().unwrap_or_default())
        .param("inputs", options.inputs_param()?)
        .param("robjects", options.robjects_param())
        .param("files", options.files_param())
        .param("saveworkspace", options.save_workspace))
}

/// Numbers are sent as-is; absent ones as an empty value.
fn optional_number(value: Option<u64>) -> Value {
    value.map_or_else(|| Value::from(""), Value::from)
}
