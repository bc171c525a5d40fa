//! Client of the `org.fcitx.Fcitx.InputMethod` interface served by the fcitx daemon on
//! `org.fcitx.Fcitx-<display number>`.
//!
//! ```rust,no_run
//! use fcitx_im_client::{
//!     transport::{display_number_from_env, BusType, ProxyFlags},
//!     FcitxInputMethod,
//! };
//!
//! async fn run() -> fcitx_im_client::Result<()> {
//!     let im = FcitxInputMethod::new(
//!         BusType::Session,
//!         ProxyFlags::empty(),
//!         display_number_from_env(),
//!     )
//!     .await?;
//!     if let Some(list) = im.im_list().await {
//!         for item in list.enabled() {
//!             println!("{} ({})", item.name(), item.unique_name());
//!         }
//!     }
//!     im.set_current_im("pinyin").await;
//!     Ok(())
//! }
//! ```

pub mod dbus;
mod error;
pub mod im_list;
pub mod input_method;
pub mod log;
pub mod relay;
pub mod signal;
pub mod transport;

pub use self::{
    error::Error,
    im_list::{InputMethodItem, InputMethodList},
    input_method::FcitxInputMethod,
};

pub type Result<T> = std::result::Result<T, Error>;
