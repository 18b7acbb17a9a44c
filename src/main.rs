use std::fs;

use glam::Vec3;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use wowbot_rust::common::{Frame, Rect};
use wowbot_rust::config::Configuration;
use wowbot_rust::detection::{DetectionOutcome, NpcNameFinder, NpcNames};
use wowbot_rust::error::AppError;
use wowbot_rust::navigation::plan_waypoints;

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Parse `[[x, y], [x, y, z], ...]` into world points.
fn parse_route(json: &str) -> Result<Vec<Vec3>, AppError> {
    let points: Vec<Vec<f32>> = serde_json::from_str(json)?;
    points
        .into_iter()
        .enumerate()
        .map(|(i, p)| match p.as_slice() {
            [x, y] => Ok(Vec3::new(*x, *y, 0.0)),
            [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
            _ => Err(AppError::InvalidRoute(format!(
                "Point {} has {} coordinates",
                i,
                p.len()
            ))),
        })
        .collect()
}

fn detect(configuration: &Configuration, path: &str) -> Result<(), AppError> {
    let image = image::open(path)?;
    let frame = Frame::from_dynamic_image(&image);
    let capture = Rect::new(0, 0, frame.width() as i32, frame.height() as i32);

    let mut finder = NpcNameFinder::new(
        configuration.npc_finder.clone(),
        capture,
        NpcNames::ENEMY | NpcNames::NEUTRAL,
    );
    if finder.update(&frame.view()?, &CancellationToken::new()) == DetectionOutcome::Cancelled {
        return Ok(());
    }

    tracing::info!(
        "[Main] {} npcs, {} targets, {} adds in {}",
        finder.npc_count(),
        finder.target_count(),
        finder.add_count(),
        path
    );
    for npc in finder.npcs() {
        tracing::info!(
            "[Main] {:?} target: {} add: {} click {:?}",
            npc.rect,
            npc.is_target,
            npc.is_add,
            finder.to_screen_coordinates(npc.click_point)
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let configuration = Configuration::load(args.first().map(String::as_str))?;
    init_logging(&configuration.log_level);

    if let Some(screenshot) = args.get(1) {
        detect(&configuration, screenshot)?;
    }

    if let Some(route_path) = args.get(2) {
        let route = parse_route(&fs::read_to_string(route_path)?)?;
        let waypoints = plan_waypoints(&route, Vec3::ZERO, false, configuration.route.there_and_back);
        tracing::info!("[Main] {} waypoints from the origin", waypoints.len());
        for (i, point) in waypoints.iter().enumerate() {
            tracing::info!("[Main] {}: {}", i, point);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_points_accept_two_or_three_coordinates() {
        let route = parse_route("[[1, 2], [3, 4, 5]]").unwrap();
        assert_eq!(route, vec![Vec3::new(1.0, 2.0, 0.0), Vec3::new(3.0, 4.0, 5.0)]);
    }

    #[test]
    fn malformed_route_point_is_rejected() {
        assert!(matches!(parse_route("[[1]]"), Err(AppError::InvalidRoute(_))));
        assert!(matches!(parse_route("{}"), Err(AppError::Json(_))));
    }
}
