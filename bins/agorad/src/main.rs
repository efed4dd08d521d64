// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Agora daemon (agorad)
//!
//! Serves the dual-channel message API and, with `--headless`, runs the graph
//! explorer against a logging surface with its screen feed wired straight to
//! the dispatcher.
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use agora_app_core::{ConfigService, ExplorerPrefs, ProcessingMode, ScreenSource};
use agora_config_fs::FsConfigStore;
use agora_dispatch::{Dispatcher, LexicalQuoteIndex, OllamaGenerator};
use agora_display::{HttpEnhancer, HttpScreenSource};
use agora_explorer::{Explorer, ExplorerEvent, GraphSource, JsonSource, ProceduralSource};
use agora_graph::{ForceLayout, GenerationParams, GraphStore};

mod api;
mod headless;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Port for the HTTP API
    #[clap(short, long, default_value_t = 5000)]
    port: u16,

    /// Address to bind
    #[clap(long, default_value = "127.0.0.1")]
    bind: String,

    /// Config directory (defaults to the platform config dir)
    #[clap(long)]
    config_dir: Option<PathBuf>,

    /// Graph JSON document (`{nodes, links}`); procedural when absent
    #[clap(short, long)]
    graph: Option<PathBuf>,

    /// Keep only quotes carrying this tag
    #[clap(long, requires = "graph")]
    tag: Option<String>,

    /// Procedural node count
    #[clap(long, default_value_t = 60)]
    nodes: usize,

    /// Procedural connection density (0..=1)
    #[clap(long, default_value_t = 0.3)]
    density: f32,

    /// Procedural seed
    #[clap(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Mode for the returned reply (echo, llm, quote, rag)
    #[clap(long)]
    user_mode: Option<ProcessingMode>,

    /// Mode for the on-screen text (echo, llm, quote, rag)
    #[clap(long)]
    screen_mode: Option<ProcessingMode>,

    /// Ollama-compatible generator endpoint
    #[clap(long)]
    generator: Option<String>,

    /// Generator model name
    #[clap(long)]
    model: Option<String>,

    /// Run the explorer headless and feed it the screen channel
    #[clap(long)]
    headless: bool,

    /// Poll another daemon's screen channel instead of this one (headless only)
    #[clap(long, requires = "headless")]
    screen_source: Option<String>,

    /// Rewrite endpoint used before typing (headless only)
    #[clap(long, requires = "headless")]
    enhance: Option<String>,

    /// Log debug output
    #[clap(short, long)]
    verbose: bool,
}

impl Args {
    fn graph_source(&self) -> Box<dyn GraphSource> {
        match &self.graph {
            Some(path) => {
                let source = JsonSource::file(path);
                Box::new(match &self.tag {
                    Some(tag) => source.with_tag(tag),
                    None => source,
                })
            }
            None => Box::new(ProceduralSource::new(GenerationParams {
                node_count: self.nodes,
                density: self.density,
                seed: self.seed,
            })),
        }
    }

    fn apply_to(&self, prefs: &mut ExplorerPrefs) {
        if let Some(mode) = self.user_mode {
            prefs.dispatch.user_mode = mode;
        }
        if let Some(mode) = self.screen_mode {
            prefs.dispatch.screen_mode = mode;
        }
        if let Some(endpoint) = &self.generator {
            prefs.dispatch.generator_endpoint.clone_from(endpoint);
        }
        if let Some(model) = &self.model {
            prefs.dispatch.generator_model.clone_from(model);
        }
        if self.enhance.is_some() {
            prefs.display.enhance = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting Agora daemon (agorad)...");

    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("opening config store")?;
    info!(dir = %store.base().display(), "config store");
    let config = ConfigService::new(store);
    let mut prefs = config.load_prefs();
    args.apply_to(&mut prefs);
    let prefs = prefs.sanitized();
    info!(
        user = %prefs.dispatch.user_mode,
        screen = %prefs.dispatch.screen_mode,
        model = %prefs.dispatch.generator_model,
        "dispatch modes"
    );

    let quotes = Arc::new(LexicalQuoteIndex::new());
    let generator = OllamaGenerator::new(
        &prefs.dispatch.generator_endpoint,
        prefs.dispatch.generator_model.clone(),
        prefs.dispatch.generation_timeout(),
    )?;
    let dispatcher = Arc::new(Dispatcher::new(
        Handle::current(),
        &prefs.dispatch,
        Arc::new(generator),
        quotes.clone(),
    ));

    let source = args.graph_source();
    let mut headless = None;
    if args.headless {
        let surface = Arc::new(headless::LogSurface::default());
        let mut explorer = Explorer::new(
            Handle::current(),
            surface.clone(),
            surface.clone(),
            prefs.clone(),
        )
        .with_quote_index(quotes.clone());
        if let Some(endpoint) = &args.enhance {
            explorer = explorer.with_enhancer(Arc::new(HttpEnhancer::new(endpoint.clone())));
        }
        explorer.load_graph(source.as_ref()).await?;
        let feed: Arc<dyn ScreenSource> = match &args.screen_source {
            Some(url) => {
                let source = HttpScreenSource::new(url);
                info!(url = source.url(), "polling remote screen channel");
                Arc::new(source)
            }
            None => Arc::new(dispatcher.screen_slot().clone()),
        };
        explorer.attach_feed(feed);
        explorer.handle_event(ExplorerEvent::ToggleOrbit);
        let mut layout = ForceLayout::default();
        layout.link_distance = prefs.render.link_distance;
        let physics = headless::spawn_physics(explorer.graph().clone(), layout, surface);
        info!("headless explorer running");
        headless = Some((explorer, physics));
    } else {
        let store = GraphStore::from_data(source.fetch().await?)?;
        quotes.rebuild(&store);
        info!(quotes = quotes.len(), "quote index built");
    }

    let config = Arc::new(Mutex::new((config, prefs)));
    let persist: api::SettingsHook = Arc::new(move |settings| {
        let mut guard = config.lock().unwrap_or_else(PoisonError::into_inner);
        let (config, prefs) = &mut *guard;
        prefs.dispatch.user_mode = settings.user_mode;
        prefs.dispatch.screen_mode = settings.screen_mode;
        if let Err(err) = config.save_prefs(prefs) {
            warn!(%err, "could not persist settings");
        }
    });
    let app = api::router(api::AppState::new(dispatcher.clone()).with_settings_hook(persist));

    let addr = format!("{}:{}", args.bind, args.port).parse::<std::net::SocketAddr>()?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP API server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(%err, "could not listen for ctrl-c");
            }
        })
        .await?;

    info!("shutting down");
    if let Some((mut explorer, physics)) = headless {
        physics.abort();
        explorer.dispose();
    }
    dispatcher.shutdown();
    Ok(())
}
