use std::sync::Arc;

use getset::{CopyGetters, Getters};

use crate::{
    dbus::client::IFcitxInputMethodService,
    im_list::InputMethodList,
    relay::ImListChangedSubscription,
    transport::{BusType, ProxyFlag, ProxyFlags, Transport},
    Error, Result,
};

/// Client of the input method interface of the fcitx daemon.
///
/// Remote failures never reach the caller: they are logged, and calls with a reply return
/// `None`. `None` therefore can't tell an unreachable daemon from a missing value.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct FcitxInputMethod {
    #[getset(get = "pub")]
    service: Arc<dyn IFcitxInputMethodService + Send + Sync>,
    #[getset(get_copy = "pub")]
    flags: ProxyFlags,
}

impl FcitxInputMethod {
    pub async fn new(bus_type: BusType, flags: ProxyFlags, display_number: i32) -> Result<Self> {
        let transport = Transport::connect(bus_type, flags, display_number).await?;
        Self::new_with_transport(&transport).await
    }

    pub async fn new_with_transport(transport: &Transport) -> Result<Self> {
        let proxy = transport.proxy().await?;
        Ok(Self::new_with(Arc::new(proxy), transport.flags()))
    }

    pub fn new_with(
        service: Arc<dyn IFcitxInputMethodService + Send + Sync>,
        flags: ProxyFlags,
    ) -> Self {
        Self { service, flags }
    }

    /// The configured input methods, from the property cache if it holds a value.
    pub async fn im_list(&self) -> Option<InputMethodList> {
        let cached = match self.service.cached_im_list() {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("unable to read cached IMList: {e}");
                None
            }
        };
        let entries = match cached {
            Some(entries) => entries,
            None => match self.service.im_list().await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("{e}");
                    return None;
                }
            },
        };
        Some(InputMethodList::from_entries(entries))
    }

    pub async fn set_im_list(&self, im_list: &InputMethodList) {
        if let Err(e) = self.service.set_im_list(im_list.to_entries()).await {
            tracing::warn!("{e}");
        }
    }

    pub async fn current_im(&self) -> Option<String> {
        self.service
            .get_current_im()
            .await
            .inspect_err(|e| tracing::warn!("{e}"))
            .ok()
    }

    pub async fn set_current_im(&self, im: &str) {
        if let Err(e) = self.service.set_current_im(im).await {
            tracing::warn!("unable to send SetCurrentIM: {e}");
        }
    }

    pub async fn reload_config(&self) {
        if let Err(e) = self.service.reload_config().await {
            tracing::warn!("unable to send ReloadConfig: {e}");
        }
    }

    pub async fn restart(&self) {
        if let Err(e) = self.service.restart().await {
            tracing::warn!("unable to send Restart: {e}");
        }
    }

    pub async fn configure(&self) {
        if let Err(e) = self.service.configure().await {
            tracing::warn!("unable to send Configure: {e}");
        }
    }

    pub async fn configure_addon(&self, addon: &str) {
        if let Err(e) = self.service.configure_addon(addon).await {
            tracing::warn!("unable to send ConfigureAddon: {e}");
        }
    }

    /// The addon providing input method `im`.
    pub async fn im_addon(&self, im: &str) -> Option<String> {
        self.service
            .get_im_addon(im)
            .await
            .inspect_err(|e| tracing::warn!("{e}"))
            .ok()
    }

    /// Asks the daemon to exit. The method is missing from the daemon's introspection data, it may
    /// be unsupported by some versions.
    pub async fn exit(&self) {
        if let Err(e) = self.service.exit().await {
            tracing::warn!("unable to send Exit: {e}");
        }
    }

    /// Should be called inside tokio runtime. Fails with [`Error::PropertiesNotLoaded`] if the
    /// proxy doesn't load properties, as property changes aren't watched then.
    pub async fn subscribe_im_list_changed(&self) -> Result<ImListChangedSubscription> {
        if self.flags.contains(ProxyFlag::DoNotLoadProperties) {
            return Err(Error::PropertiesNotLoaded);
        }
        let batches = self.service.properties_batches().await?;
        Ok(ImListChangedSubscription::spawn(batches))
    }
}
