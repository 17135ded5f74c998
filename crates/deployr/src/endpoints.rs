//! Paths of every DeployR API resource, relative to the base path.

pub mod session {
    pub const CREATE: &str = "/r/session/create";
    pub const CLOSE: &str = "/r/session/close";
    pub const PING: &str = "/r/session/ping";
    pub const EXECUTE_CODE: &str = "/r/session/execute/code";
    pub const EXECUTE_SCRIPT: &str = "/r/session/execute/script";
    pub const OUTPUT: &str = "/r/session/output";
    pub const HISTORY: &str = "/r/session/history";
    pub const SAVE_WORKSPACE: &str = "/r/session/workspace/save";
    pub const SAVE_PROJECT: &str = "/r/session/project/save";

    pub mod object {
        pub const LIST: &str = "/r/session/object/list";
        pub const GET: &str = "/r/session/object/get";
        pub const PUSH: &str = "/r/session/object/push";
        pub const UPLOAD: &str = "/r/session/object/upload";
        pub const DELETE: &str = "/r/session/object/delete";
        pub const SAVE: &str = "/r/session/object/save";
        pub const LOAD: &str = "/r/session/object/load";
    }

    pub mod file {
        pub const LIST: &str = "/r/session/file/list";
        pub const UPLOAD: &str = "/r/session/file/upload";
        pub const DOWNLOAD: &str = "/r/session/file/download";
        pub const DELETE: &str = "/r/session/file/delete";
        pub const SAVE: &str = "/r/session/file/save";
        pub const LOAD: &str = "/r/session/file/load";
    }
}

pub mod repository {
    pub mod object {
        pub const LIST: &str = "/r/repository/object/list";
        pub const UPLOAD: &str = "/r/repository/object/upload";
        pub const DOWNLOAD: &str = "/r/repository/object/download";
        pub const DELETE: &str = "/r/repository/object/delete";
    }

    pub mod file {
        pub const LIST: &str = "/r/repository/file/list";
        pub const UPLOAD: &str = "/r/repository/file/upload";
        pub const DOWNLOAD: &str = "/r/repository/file/download";
        pub const DELETE: &str = "/r/repository/file/delete";
    }
}

pub mod project {
    pub const LIST: &str = "/r/project/list";
    pub const LOAD: &str = "/r/project/load";
    pub const ARTIFACTS: &str = "/r/project/artifacts";
    pub const DELETE: &str = "/r/project/delete";
}

pub mod user {
    pub const LOGIN: &str = "/r/user/login";
    pub const LOGOUT: &str = "/r/user/logout";
    pub const WHOAMI: &str = "/r/user/whoami";
    pub const AUTOSAVE: &str = "/r/user/autosave";
    pub const LIVE: &str = "/r/user/live";
}

pub mod script {
    pub const LIST: &str = "/r/script/list";
    pub const EXECUTE: &str = "/r/script/execute";
}
