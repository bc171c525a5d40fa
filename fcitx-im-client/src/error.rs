use thiserror::Error;

use crate::transport::BusType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to connect to the {0} bus: {1}")]
    Connection(BusType, #[source] zbus::Error),
    #[error("DBUS_STARTER_ADDRESS is not set")]
    StarterAddressMissing,
    #[error("input method is listed more than once: {0}")]
    DuplicateInputMethod(String),
    #[error("properties are not loaded on this proxy, IMList changes are not delivered")]
    PropertiesNotLoaded,
    #[error(transparent)]
    Zbus(#[from] zbus::Error),
}
