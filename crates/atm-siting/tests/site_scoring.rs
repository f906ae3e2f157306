use atm_siting::config::DataConfig;
use atm_siting::ingest::LoadError;
use atm_siting::scoring::Factor;
use atm_siting::spatial::{haversine_km, ResolveError};
use atm_siting::{SiteScoringService, SitingError};
use std::path::Path;
use tempfile::TempDir;

fn service_with_indicators(bytes: &[u8]) -> (TempDir, SiteScoringService) {
    let dir = tempfile::tempdir().expect("temp dir");
    let files = DataConfig::in_dir(dir.path());
    std::fs::write(&files.indicators, bytes).expect("write indicators");
    (dir, SiteScoringService::new(files))
}

#[test]
fn dar_bouazza_scores_from_population_and_competitors_only() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm,latitude,longitude,densite_norm,nb_atm\n\
dar bouazza,33.6,-7.8,80,2\n",
    );

    let assessment = service.score_by_key("Dar Bouazza").expect("commune scores");

    assert_eq!(assessment.commune, "dar bouazza");
    assert_eq!(assessment.distance_km, None);
    assert_eq!(assessment.result.score, 64.44);
    assert_eq!(
        assessment.result.weights.keys().copied().collect::<Vec<_>>(),
        vec![Factor::Population, Factor::Competitors]
    );
    let weight_sum: f64 = assessment.result.weights.values().sum();
    assert!((weight_sum - 100.0).abs() <= 0.1);
    let contribution_sum: f64 = assessment.result.contributions.values().sum();
    assert!((contribution_sum - assessment.result.score).abs() <= 0.1);
}

#[test]
fn key_resolution_is_idempotent() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm,commune,latitude,longitude,densite_norm,nb_atm,iedu,indice_acces\n\
anfa,Anfa,33.58,-7.63,62,7,55,0.8\n\
maarif,Maarif,33.57,-7.64,71,3,48,0.6\n",
    );

    let first = service.score_by_key(" MAARIF ").expect("scores");
    let second = service.score_by_key("maarif").expect("scores");
    assert_eq!(first, second);
    assert_eq!(service.catalog().indicators.loads(), 1);
}

#[test]
fn coordinate_resolution_picks_true_nearest_across_latitudes() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm,latitude,longitude,densite_norm\n\
equator,0.5,0.0,40\n\
north,60.9,10.0,40\n\
east,60.0,11.5,40\n\
south,-45.0,170.0,40\n",
    );

    let assessment = service.score_by_coordinate(60.0, 10.0).expect("scores");
    assert_eq!(assessment.commune, "east");

    let expected = haversine_km(60.0, 10.0, 60.0, 11.5);
    let distance = assessment.distance_km.expect("distance reported");
    assert!((distance - expected).abs() < 1e-9);

    let near_equator = service.score_by_coordinate(0.0, 0.2).expect("scores");
    assert_eq!(near_equator.commune, "equator");
}

#[test]
fn windows_1252_names_survive_the_fallback() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm;commune;latitude;longitude;densite_norm\n\
f\xE8s;F\xE8s;34,03;-5,0;55\n\
sal\xE9;Sal\xE9;34,05;-6,8;45\n",
    );

    let assessment = service.score_by_key("salé").expect("accented key resolves");
    assert_eq!(assessment.commune, "salé");

    let nearest = service.score_by_coordinate(34.0, -5.01).expect("scores");
    assert_eq!(nearest.commune, "fès");

    let statuses = service.layer_status();
    let indicators = statuses
        .iter()
        .find(|status| status.layer == "indicators")
        .and_then(|status| status.source.as_ref())
        .expect("indicator layer loaded");
    assert_eq!(indicators.encoding.label(), "windows-1252");
}

#[test]
fn table_without_usable_coordinates_is_not_found() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm,latitude,longitude,densite_norm\n\
anfa,,-7.63,40\n\
maarif,n/a,-7.64,40\n",
    );

    assert!(matches!(
        service.score_by_coordinate(33.58, -7.63),
        Err(SitingError::Resolve(ResolveError::NotFound { .. }))
    ));
    assert!(matches!(
        service.score_by_key("anfa"),
        Err(SitingError::Resolve(ResolveError::NotFound { .. }))
    ));
}

#[test]
fn missing_required_column_names_it() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm,latitude,longitude\nanfa,33.58,-7.63\n",
    );

    match service.score_by_key("anfa") {
        Err(SitingError::Load(LoadError::Schema { column, found, .. })) => {
            assert_eq!(column, "densite_norm");
            assert_eq!(found, vec!["commune_norm", "latitude", "longitude"]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn missing_source_file_is_reported() {
    let service = SiteScoringService::new(DataConfig::in_dir(Path::new("./no-such-data-dir")));
    assert!(matches!(
        service.score_by_key("anfa"),
        Err(SitingError::Load(LoadError::SourceNotFound { .. }))
    ));
}

#[test]
fn out_of_range_query_is_rejected_before_loading() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm,latitude,longitude,densite_norm\nanfa,33.58,-7.63,40\n",
    );

    assert!(matches!(
        service.score_by_coordinate(120.0, -7.6),
        Err(SitingError::InvalidCoordinate { .. })
    ));
    assert!(matches!(
        service.score_by_coordinate(f64::NAN, -7.6),
        Err(SitingError::InvalidCoordinate { .. })
    ));
    assert_eq!(service.catalog().indicators.loads(), 0);
}

#[test]
fn reload_picks_up_rewritten_files() {
    let (_dir, service) = service_with_indicators(
        b"commune_norm,latitude,longitude,densite_norm\nanfa,33.58,-7.63,40\n",
    );
    let before = service.score_by_key("anfa").expect("scores");

    std::fs::write(
        &service.files().indicators,
        "commune_norm,latitude,longitude,densite_norm\nanfa,33.58,-7.63,90\n",
    )
    .expect("rewrite indicators");
    assert_eq!(service.score_by_key("anfa").expect("cached").result.score, before.result.score);

    service.reload();
    let after = service.score_by_key("anfa").expect("reloaded");
    assert_eq!(after.result.score, 90.0);
    assert_eq!(service.catalog().indicators.loads(), 2);
}
