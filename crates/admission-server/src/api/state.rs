use crate::handlers::SharedAdmissionHandler;

pub(crate) struct ApiServerState {
    pub(crate) handler: SharedAdmissionHandler,
}
