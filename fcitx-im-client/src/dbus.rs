pub const SERVICE_NAME_BASE: &str = "org.fcitx.Fcitx";
pub const OBJECT_PATH: &str = "/inputmethod";
pub const INTERFACE_NAME: &str = "org.fcitx.Fcitx.InputMethod";
pub const IM_LIST_PROPERTY: &str = "IMList";

pub mod entity {
    /// (sssb): name, unique name, language code, enabled
    pub type ImListEntry = (String, String, String, bool);
}

pub mod client {
    use std::fmt::Debug;

    use futures_util::{
        stream::{self, BoxStream},
        StreamExt,
    };
    use tracing::instrument;
    use zbus::{fdo::PropertiesProxy, proxy, Result as ZbusResult};

    use crate::{
        dbus::{entity::ImListEntry, IM_LIST_PROPERTY},
        relay::PropertiesBatch,
    };

    /// make the daemon replaceable
    #[async_trait::async_trait]
    pub trait IFcitxInputMethodService: Debug {
        /// The value of IMList held by the local property cache, if any.
        fn cached_im_list(&self) -> ZbusResult<Option<Vec<ImListEntry>>>;

        async fn im_list(&self) -> ZbusResult<Vec<ImListEntry>>;

        async fn set_im_list(&self, im_list: Vec<ImListEntry>) -> ZbusResult<()>;

        async fn get_current_im(&self) -> ZbusResult<String>;

        async fn set_current_im(&self, im: &str) -> ZbusResult<()>;

        async fn reload_config(&self) -> ZbusResult<()>;

        async fn restart(&self) -> ZbusResult<()>;

        async fn configure(&self) -> ZbusResult<()>;

        async fn configure_addon(&self, addon: &str) -> ZbusResult<()>;

        async fn get_im_addon(&self, im: &str) -> ZbusResult<String>;

        async fn exit(&self) -> ZbusResult<()>;

        /// Property change notifications of the interface, split into batches.
        async fn properties_batches(&self) -> ZbusResult<BoxStream<'static, PropertiesBatch>>;
    }

    #[proxy(
        default_service = "org.fcitx.Fcitx",
        default_path = "/inputmethod",
        interface = "org.fcitx.Fcitx.InputMethod"
    )]
    pub trait FcitxInputMethodService {
        #[zbus(name = "GetCurrentIM", no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn get_current_im(&self) -> ZbusResult<String>;

        #[zbus(name = "SetCurrentIM", no_reply, no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn set_current_im(&self, im: &str) -> ZbusResult<()>;

        #[zbus(no_reply, no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn reload_config(&self) -> ZbusResult<()>;

        #[zbus(no_reply, no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn restart(&self) -> ZbusResult<()>;

        #[zbus(no_reply, no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn configure(&self) -> ZbusResult<()>;

        #[zbus(no_reply, no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn configure_addon(&self, addon: &str) -> ZbusResult<()>;

        #[zbus(name = "GetIMAddon", no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn get_im_addon(&self, im: &str) -> ZbusResult<String>;

        /// Not listed in the introspection data published by the daemon.
        #[zbus(no_reply, no_autostart)]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn exit(&self) -> ZbusResult<()>;

        // Attributes on a property getter also land on the generated cache helpers.
        #[zbus(property, name = "IMList")]
        fn im_list(&self) -> ZbusResult<Vec<ImListEntry>>;

        #[zbus(property, name = "IMList")]
        #[instrument(level = "debug", skip(self), err, ret)]
        fn set_im_list(&self, im_list: Vec<ImListEntry>) -> ZbusResult<()>;
    }

    #[async_trait::async_trait]
    impl IFcitxInputMethodService for FcitxInputMethodServiceProxy<'static> {
        fn cached_im_list(&self) -> ZbusResult<Option<Vec<ImListEntry>>> {
            self.inner().cached_property(IM_LIST_PROPERTY)
        }

        async fn im_list(&self) -> ZbusResult<Vec<ImListEntry>> {
            self.im_list().await
        }

        async fn set_im_list(&self, im_list: Vec<ImListEntry>) -> ZbusResult<()> {
            self.set_im_list(im_list).await
        }

        async fn get_current_im(&self) -> ZbusResult<String> {
            self.get_current_im().await
        }

        async fn set_current_im(&self, im: &str) -> ZbusResult<()> {
            self.set_current_im(im).await
        }

        async fn reload_config(&self) -> ZbusResult<()> {
            self.reload_config().await
        }

        async fn restart(&self) -> ZbusResult<()> {
            self.restart().await
        }

        async fn configure(&self) -> ZbusResult<()> {
            self.configure().await
        }

        async fn configure_addon(&self, addon: &str) -> ZbusResult<()> {
            self.configure_addon(addon).await
        }

        async fn get_im_addon(&self, im: &str) -> ZbusResult<String> {
            self.get_im_addon(im).await
        }

        async fn exit(&self) -> ZbusResult<()> {
            self.exit().await
        }

        async fn properties_batches(&self) -> ZbusResult<BoxStream<'static, PropertiesBatch>> {
            let inner = self.inner();
            let properties = PropertiesProxy::builder(inner.connection())
                .destination(inner.destination().clone().into_owned())?
                .path(inner.path().clone().into_owned())?
                .build()
                .await?;
            let stream = properties.receive_properties_changed().await?;
            Ok(stream
                .flat_map(|changed| {
                    let batches = match changed.args() {
                        Ok(args) => PropertiesBatch::from_signal(
                            args.interface_name().as_str(),
                            args.changed_properties().keys().map(|name| name.to_string()),
                            args.invalidated_properties()
                                .iter()
                                .map(|name| name.to_string()),
                        ),
                        Err(e) => {
                            tracing::warn!("unable to parse PropertiesChanged: {e:?}");
                            vec![]
                        }
                    };
                    stream::iter(batches)
                })
                .boxed())
        }
    }

}
