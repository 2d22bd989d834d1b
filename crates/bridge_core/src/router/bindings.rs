//! Binds both vocabularies to the external facades.

use std::sync::Arc;

use serde_json::Value;
use shared::protocol::{CURRENT_TABS_COUNT, REQUEST_DATA, TAB_ACTIVATED};

use super::{
    commands::{AppCommand, RequestAction},
    ApplicationCommandTable, CommandArgs, RequestActionTable,
};
use crate::{
    bridge::Bridge,
    collaborators::{AppFacade, RequestWorkspace},
};

/// Binds each `Variant => method` pair so the handler forwards its arguments
/// to `target.method(args)`.
macro_rules! forward {
    ($builder:expr, $target:expr, $kind:ident { $($variant:ident => $method:ident),+ $(,)? }) => {{
        let builder = $builder;
        $(
            let target = Arc::clone(&$target);
            let builder = builder.bind($kind::$variant, move |args: CommandArgs| {
                let target = Arc::clone(&target);
                async move { target.$method(args).await }
            });
        )+
        builder
    }};
}

pub fn bind_app_commands(
    facade: Arc<dyn AppFacade>,
    bridge: Arc<Bridge>,
) -> ApplicationCommandTable {
    let builder = forward!(ApplicationCommandTable::builder(), facade, AppCommand {
        ShowSettings => show_settings,
        About => about,
        OpenLicense => open_license,
        ImportData => import_data,
        ExportData => export_data,
        OpenSaved => open_saved,
        OpenHistory => open_history,
        OpenDrive => open_drive,
        OpenMessages => open_messages,
        LoginExternalWebservice => login_external_webservice,
        OpenCookieManager => open_cookie_manager,
        OpenHostsEditor => open_hosts_editor,
        OpenThemes => open_themes,
        OpenRequestsWorkspace => open_requests_workspace,
        OpenWebSocket => open_web_socket,
        PopupMenu => popup_menu,
        ProcessExternalFile => process_external_file,
        OpenOnboarding => open_onboarding,
        OpenWorkspaceDetails => open_workspace_details,
        ExportWorkspace => export_workspace,
    });

    let (tabs_facade, tabs_bridge) = (Arc::clone(&facade), Arc::clone(&bridge));
    let (activate_facade, activate_bridge) = (Arc::clone(&facade), Arc::clone(&bridge));
    let (data_facade, data_bridge) = (facade, bridge);

    builder
        .bind(AppCommand::GetTabsCount, move |args: CommandArgs| {
            let (facade, bridge) = (Arc::clone(&tabs_facade), Arc::clone(&tabs_bridge));
            async move {
                let id = args.call_id()?;
                let result = facade
                    .tabs_count()
                    .await
                    .map(|count| vec![Value::from(count)]);
                bridge.reply(CURRENT_TABS_COUNT, id, result)?;
                Ok(())
            }
        })
        .bind(AppCommand::ActivateTab, move |args: CommandArgs| {
            let facade = Arc::clone(&activate_facade);
            let bridge = Arc::clone(&activate_bridge);
            async move {
                let id = args.call_id()?;
                let result = match args.parse::<usize>(1) {
                    Ok(index) => facade.activate_tab(index).await.map(|()| Vec::new()),
                    Err(err) => Err(err),
                };
                bridge.reply(TAB_ACTIVATED, id, result)?;
                Ok(())
            }
        })
        .bind(AppCommand::GetRequestData, move |args: CommandArgs| {
            let (facade, bridge) = (Arc::clone(&data_facade), Arc::clone(&data_bridge));
            async move {
                let id = args.call_id()?;
                let result = facade.request_data().await.map(|request| vec![request]);
                bridge.reply(REQUEST_DATA, id, result)?;
                Ok(())
            }
        })
        .build()
}

pub fn bind_request_actions(workspace: Arc<dyn RequestWorkspace>) -> RequestActionTable {
    forward!(RequestActionTable::builder(), workspace, RequestAction {
        Save => save,
        SaveAs => save_as,
        NewTab => new_tab,
        SendCurrent => send_current,
        UpdateRequest => update_request,
        CloseTab => close_tab,
    })
    .build()
}
