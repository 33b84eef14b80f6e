use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;
use dioxus::prelude::*;

use crate::infra::http::pocketbase::{ClientConfig, PocketBaseClient};
use crate::infra::store::sqlite::SqliteViewStore;
use crate::ui::screens::invoices::InvoiceList;
use crate::ui::screens::students::StudentDirectory;
use crate::usecase::ports::collection::CollectionClient;
use crate::usecase::ports::view_store::ViewStore;

/// The backend client and the local view store, shared through context so
/// every screen talks to the same instances.
#[derive(Clone)]
pub struct AppServices {
    pub client: Arc<dyn CollectionClient>,
    pub views: Arc<dyn ViewStore>,
}

fn build_services() -> Result<AppServices> {
    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "connecting to backend");
    let view_store = SqliteViewStore::open_default()?;
    Ok(AppServices {
        client: Arc::new(PocketBaseClient::new(config)),
        views: Arc::new(view_store),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Students,
    Invoices,
}

impl Screen {
    fn label(self) -> &'static str {
        match self {
            Screen::Students => "Students",
            Screen::Invoices => "Invoices",
        }
    }
}

#[component]
pub fn App() -> Element {
    let services = use_hook(|| Rc::new(build_services()));
    let services = match services.as_ref() {
        Ok(services) => services.clone(),
        Err(err) => {
            return rsx! {
                div {
                    p { "Failed to start: {err}" }
                }
            };
        }
    };
    use_context_provider(|| services);

    let mut screen = use_signal(|| Screen::Students);

    rsx! {
        div { style: "font-family: sans-serif; padding: 12px;",
            nav { style: "display: flex; gap: 12px; align-items: center; border-bottom: 1px solid #bbb; padding-bottom: 8px;",
                h1 { style: "margin: 0; font-size: 18px;", "Classdesk" }
                for tab in [Screen::Students, Screen::Invoices] {
                    button {
                        style: if screen() == tab { "font-weight: bold;" } else { "" },
                        onclick: move |_| *screen.write() = tab,
                        "{tab.label()}"
                    }
                }
            }

            {match screen() {
                Screen::Students => rsx! { StudentDirectory {} },
                Screen::Invoices => rsx! { InvoiceList {} },
            }}
        }
    }
}
