//! Command-line viewer of the emotion map
//!
//! Loads every emotion from the backend into a headless map, applies the
//! requested filter and prints the visible markers:
//! ```bash
//! cargo run -p emomap-pages -- --emotion happy --window 24h
//! cargo run -p emomap-pages -- --demo
//! ```
//!
//! Configuration is read from `EMOMAP_*` environment variables.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use emomap_client::{DisabledGeocoder, HttpEmotionApi, InMemoryEmotionApi, NominatimGeocoder};
use emomap_common::{try_init_tracing_with_config, AppConfig, AppResult, TracingConfig};
use emomap_core::{
    EmotionApi, EmotionFilter, EmotionId, EmotionRecord, FilterState, LatLng, ReverseGeocoder,
    TimeWindow, Timestamp,
};
use emomap_map::{
    visual_for, GeoLocationProvider, HeadlessSurface, MapController, MapSettings,
    NotificationPresenter, ToastMode, UnsupportedLocator,
};
use emomap_pages::PageError;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!(code = e.error_code(), error = %e, "emomap failed");
            eprintln!("emomap: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

#[derive(Debug, Parser)]
#[command(name = "emomap", about = "Print the emotions a map filter leaves visible")]
struct Args {
    /// Serve a few sample emotions from memory instead of the backend
    #[arg(long)]
    demo: bool,

    /// Emotion type to keep, or "all"
    #[arg(long, default_value_t = EmotionFilter::All, value_parser = EmotionFilter::from_str)]
    emotion: EmotionFilter,

    /// Age window: 1h, 6h, 24h, 7d or "all"
    #[arg(long, default_value_t = TimeWindow::All, value_parser = TimeWindow::from_str)]
    window: TimeWindow,
}

impl Args {
    fn filter(&self) -> FilterState {
        FilterState::new(self.emotion, self.window)
    }
}

async fn run(args: Args) -> AppResult<()> {
    let config = AppConfig::from_env()?;
    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let filter = args.filter();
    info!(env = ?config.app.env, demo = args.demo, api = %config.api.base_url, "Configuration loaded");

    let api: Arc<dyn EmotionApi> = if args.demo {
        Arc::new(demo_backend(config.map.center))
    } else {
        Arc::new(HttpEmotionApi::new(&config.api)?)
    };
    let geocoder: Arc<dyn ReverseGeocoder> = if config.geocoder.enabled && !args.demo {
        Arc::new(NominatimGeocoder::new(&config.geocoder)?)
    } else {
        Arc::new(DisabledGeocoder)
    };

    let surface = HeadlessSurface::new();
    let controller = MapController::new(
        MapSettings::from_config(&config.map, &config.geolocation),
        Box::new(surface.clone()),
        api,
        Arc::new(GeoLocationProvider::new(Arc::new(UnsupportedLocator))),
        Arc::new(NotificationPresenter::new(ToastMode::Stacked)),
    );

    controller.initialize_default().map_err(PageError::from)?;
    controller.load_emotions().await.map_err(PageError::from)?;
    let visible = controller.apply_filters(filter).map_err(PageError::from)?;

    println!(
        "{visible} of {} emotions match {} / {}",
        controller.marker_count(),
        filter.emotion,
        filter.window
    );
    for id in controller.visible_ids() {
        if let Some(record) = controller.record(id) {
            print_marker(&record, geocoder.as_ref()).await;
        }
    }

    controller.destroy();
    Ok(())
}

async fn print_marker(record: &EmotionRecord, geocoder: &dyn ReverseGeocoder) {
    let visual = visual_for(&record.emotion_type, record.custom_emoji.as_deref());
    let Some(position) = record.coordinates() else {
        return;
    };
    let place = geocoder
        .reverse(position)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| position.to_string());
    println!(
        "#{:<5} {} {:<4} {}  {}",
        record.id,
        visual.glyph,
        visual.name,
        place,
        record.text().unwrap_or_default()
    );
}

/// A handful of emotions around `center` for trying the viewer offline
fn demo_backend(center: LatLng) -> InMemoryEmotionApi {
    let samples = [
        (1, "happy", 0.010, 0.012, 1, "阳光很好"),
        (2, "calm", -0.008, 0.004, 5, "河边散步"),
        (3, "tired", 0.003, -0.015, 30, "加班到很晚"),
        (4, "grateful", -0.012, -0.006, 200, "谢谢朋友的帮助"),
    ];
    let records = samples.into_iter().map(|(id, kind, dlat, dlng, hours, text)| {
        let mut record = EmotionRecord::new(
            EmotionId::new(id),
            kind,
            Timestamp::from(Utc::now() - Duration::hours(hours)),
        )
        .at(LatLng::new(center.lat + dlat, center.lng + dlng));
        record.emotion_text = Some(text.to_string());
        record
    });
    InMemoryEmotionApi::with_emotions(records)
}
