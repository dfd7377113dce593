use log::{info, warn};
use time::format_description::well_known::Rfc3339;

use career_path::graph_utils::fallback::fallback_dataset;
use career_path::graph_utils::graph::{PathType, Track};
use career_path::ingest::loader::{DatasetLoader, HttpSheetFetcher};
use career_path::navigation::session::{CareerPathSession, DatasetOrigin, LoadOutcome};
use career_path::navigation::state::PathFilter;
use career_path::persistence::settings::AppSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = AppSettings::load().unwrap_or_else(|e| {
        warn!("could not read settings from {}: {}; using defaults", AppSettings::settings_dir().display(), e);
        AppSettings::default()
    });

    // The bundled dataset is shown until (and unless) the sheets load
    let mut session = CareerPathSession::new(fallback_dataset());
    info!(
        "starting on bundled dataset: {} nodes, {} edges",
        session.dataset().node_count(),
        session.dataset().edge_count()
    );

    let ticket = session.begin_load();
    let result = match (settings.sources(), HttpSheetFetcher::new(settings.request_timeout())) {
        (Ok(sources), Ok(fetcher)) => {
            DatasetLoader::new(fetcher, sources, settings.normalize_policy()).load().await
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    };
    if let LoadOutcome::Failed(e) = session.finish_load(ticket, result) {
        println!("Showing bundled data, sheet load failed: {}", e);
        session.dismiss_notice();
    }

    match session.origin() {
        DatasetOrigin::Fallback => println!("Source: bundled dataset"),
        DatasetOrigin::Remote { loaded_at } => {
            println!("Source: published sheets (loaded {})", loaded_at.format(&Rfc3339)?)
        }
    }

    for track in Track::ALL {
        session.set_active_track(track);
        let view = session.view();
        println!(
            "{} ({}): {} nodes, {} edges, subtracks: {}",
            track.label(),
            track,
            view.node_count(),
            view.visible_edges.len(),
            view.available_subtracks.join(" / ")
        );
        for path_type in PathType::ALL {
            session.toggle_filter(path_type);
            println!("  {}: {}", path_type.label(), path_summary(&session));
            session.toggle_filter(PathFilter::All);
        }
    }

    session.close();
    Ok(())
}

// "[manager] 6 nodes, 段階1-段階6"
fn path_summary(session: &CareerPathSession) -> String {
    let filters: Vec<&str> = session.active_filters().iter().map(|f| f.as_str()).collect();
    let nodes = &session.view().visible_nodes;
    let stages = match (nodes.iter().map(|n| n.stage).min(), nodes.iter().map(|n| n.stage).max()) {
        (Some(lo), Some(hi)) => format!("{}-{}", lo.label(), hi.label()),
        _ => "none".to_string(),
    };
    format!("[{}] {} nodes, {}", filters.join(","), nodes.len(), stages)
}
