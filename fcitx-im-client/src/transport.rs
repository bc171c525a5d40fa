use std::env;

use enumflags2::{bitflags, BitFlags};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use zbus::{connection::Builder, proxy::CacheProperties, Connection};

use crate::{
    dbus::{client::FcitxInputMethodServiceProxy, SERVICE_NAME_BASE},
    Error, Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BusType {
    /// The bus which started this process, its address is taken from `DBUS_STARTER_ADDRESS`.
    Starter,
    System,
    #[default]
    Session,
}

#[bitflags]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProxyFlag {
    /// Don't keep a local copy of properties, every read goes to the daemon. Property changes
    /// are not watched either, so IMList change notifications can't be subscribed.
    DoNotLoadProperties = 0b01,
    /// Don't deliver the signals declared by the interface. It declares none, property change
    /// notifications are still delivered.
    DoNotConnectSignals = 0b10,
}

pub type ProxyFlags = BitFlags<ProxyFlag>;

/// The name of the bus service owned by the daemon serving `display_number`.
pub fn service_name(display_number: i32) -> String {
    format!("{SERVICE_NAME_BASE}-{display_number}")
}

/// Display number in `DISPLAY`, 0 if it is missing or malformed.
pub fn display_number_from_env() -> i32 {
    env::var("DISPLAY")
        .ok()
        .and_then(|display| parse_display_number(&display))
        .unwrap_or(0)
}

/// "[host]:display[.screen]"
fn parse_display_number(display: &str) -> Option<i32> {
    let (_, rest) = display.rsplit_once(':')?;
    let number = rest.split('.').next()?;
    number.parse().ok()
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Transport {
    #[getset(get_copy = "pub")]
    bus_type: BusType,
    #[getset(get_copy = "pub")]
    flags: ProxyFlags,
    #[getset(get = "pub")]
    service_name: String,
    #[getset(get = "pub")]
    connection: Connection,
}

impl Transport {
    pub async fn connect(bus_type: BusType, flags: ProxyFlags, display_number: i32) -> Result<Self> {
        let connection = Self::open(bus_type).await?;
        Ok(Self::new_with(connection, bus_type, flags, display_number))
    }

    pub fn new_with(
        connection: Connection,
        bus_type: BusType,
        flags: ProxyFlags,
        display_number: i32,
    ) -> Self {
        Self {
            bus_type,
            flags,
            service_name: service_name(display_number),
            connection,
        }
    }

    async fn open(bus_type: BusType) -> Result<Connection> {
        let res = match bus_type {
            BusType::Session => Connection::session().await,
            BusType::System => Connection::system().await,
            BusType::Starter => {
                let address =
                    env::var("DBUS_STARTER_ADDRESS").map_err(|_| Error::StarterAddressMissing)?;
                match Builder::address(address.as_str()) {
                    Ok(builder) => builder.build().await,
                    Err(e) => Err(e),
                }
            }
        };
        res.map_err(|e| Error::Connection(bus_type, e))
    }

    /// Proxy of the input method interface of the daemon bound to this transport.
    pub async fn proxy(&self) -> Result<FcitxInputMethodServiceProxy<'static>> {
        let cache_properties = if self.flags.contains(ProxyFlag::DoNotLoadProperties) {
            CacheProperties::No
        } else {
            CacheProperties::Lazily
        };
        let proxy = FcitxInputMethodServiceProxy::builder(&self.connection)
            .destination(self.service_name.clone())?
            .cache_properties(cache_properties)
            .build()
            .await?;
        tracing::debug!(
            "proxy of {} is created on the {} bus",
            self.service_name,
            self.bus_type
        );
        Ok(proxy)
    }
}
