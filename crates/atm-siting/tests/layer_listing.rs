use atm_siting::config::DataConfig;
use atm_siting::spatial::{BoundingBox, PageRequest, ResolveError};
use atm_siting::{SiteScoringService, SitingError};
use tempfile::TempDir;

const INDICATORS: &str = "commune_norm,commune,latitude,longitude,densite_norm,densite\n\
anfa,Anfa,33.58,-7.63,62,15400\n\
maarif,Maarif,33.57,-7.64,71,21000\n\
ain sebaa,Ain Sebaa,33.61,-7.53,44,\n\
tanger,Tanger,35.76,-5.83,58,9000\n";

const POIS: &str = "lat;lon;key;value;name\n\
33.59;-7.61;amenity;bank;Banque Populaire\n\
33.58;-7.62;amenity;atm;\n\
34.02;-6.84;shop;mall;Arribat Center\n";

const COMPETITORS: &str = "commune,societe,nb_atm,commune_norm,latitude,longitude\n\
Anfa,Attijariwafa,3,anfa,33.58,-7.63\n\
Maarif,,,maarif,33.57,-7.64\n";

const ATMS: &str = "name,operator,amenity,addr_city,lat,lon\n\
,Attijariwafa,atm,Casablanca,33.58,-7.63\n\
,,atm,Casablanca,33.59,-7.62\n\
CIH Bank,CIH,bank,,34.02,-6.84\n";

const COMMUNES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "commune": "Anfa", "code": "MA0102" },
      "geometry": { "type": "Polygon", "coordinates": [[[-7.7, 33.55], [-7.6, 33.55], [-7.6, 33.61]]] }
    }
  ]
}"#;

fn service() -> (TempDir, SiteScoringService) {
    let dir = tempfile::tempdir().expect("temp dir");
    let files = DataConfig::in_dir(dir.path());
    std::fs::write(&files.indicators, INDICATORS).expect("write indicators");
    std::fs::write(&files.poi, POIS).expect("write pois");
    std::fs::write(&files.competitors, COMPETITORS).expect("write competitors");
    std::fs::write(&files.communes, COMMUNES).expect("write communes");
    std::fs::write(&files.atms, ATMS).expect("write atms");
    (dir, SiteScoringService::new(files))
}

fn casablanca() -> BoundingBox {
    BoundingBox {
        south: 33.4,
        north: 33.7,
        west: -7.8,
        east: -7.4,
    }
}

#[test]
fn population_listing_pages_within_the_box() {
    let (_dir, service) = service();

    let first = service
        .population_in(casablanca(), PageRequest::new(1, 2))
        .expect("lists");
    assert_eq!(first.total_count, 3);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.items[0].id, "POP-1");
    assert_eq!(first.items[0].densite, Some(15400.0));

    let second = service
        .population_in(casablanca(), PageRequest::new(2, 2))
        .expect("lists");
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].commune_norm, "ain sebaa");
    assert_eq!(second.items[0].densite, None);
}

#[test]
fn poi_listing_filters_by_box() {
    let (_dir, service) = service();

    let page = service
        .pois_in(casablanca(), PageRequest::new(1, 300))
        .expect("lists");
    assert_eq!(page.total_count, 2);
    assert_eq!(page.items[1].kind.as_deref(), Some("atm"));
    assert_eq!(page.items[1].name, None);
}

#[test]
fn competitors_default_bank_and_count() {
    let (_dir, service) = service();

    let sites = service.competitors().expect("lists");
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[1].id, "CMP-2");
    assert_eq!(sites[1].bank_name, "Inconnue");
    assert_eq!(sites[1].atm_count, 1);
}

#[test]
fn atm_inventory_keeps_source_row_ids() {
    let (_dir, service) = service();

    let atms = service.atms().expect("lists");
    assert_eq!(atms.len(), 2);
    assert_eq!(atms[0].id, "ATM-1");
    assert_eq!(atms[0].bank_name, "Attijariwafa");
    assert_eq!(atms[0].city, "Casablanca");
    assert_eq!(atms[1].id, "ATM-3");
    assert_eq!(atms[1].bank_name, "CIH Bank");
    assert_eq!(atms[1].city, "Unknown");

    let status = service
        .layer_status()
        .into_iter()
        .find(|status| status.layer == "atms")
        .expect("atms reported");
    let source = status.source.expect("atms loaded");
    assert_eq!((source.rows, source.dropped), (2, 1));
}

#[test]
fn commune_feature_by_name_or_code() {
    let (_dir, service) = service();

    let by_name = service.commune_feature("ANFA").expect("feature found");
    let by_code = service.commune_feature("ma0102").expect("feature found");
    assert_eq!(by_name, by_code);
    assert!(by_name.property("centroid_lat").is_some());

    assert!(matches!(
        service.commune_feature("rabat"),
        Err(SitingError::Resolve(ResolveError::NotFound { .. }))
    ));
}

#[test]
fn layer_status_reports_every_layer() {
    let (dir, service) = service();
    std::fs::remove_file(dir.path().join(DataConfig::DEFAULT_POI)).expect("remove poi");

    let statuses = service.layer_status();
    let layers: Vec<_> = statuses.iter().map(|status| status.layer).collect();
    assert_eq!(layers, vec!["indicators", "competitors", "poi", "communes", "atms"]);

    let poi = &statuses[2];
    assert!(poi.source.is_none());
    assert!(poi.error.as_deref().is_some_and(|error| error.contains("not found")));

    let indicators = statuses[0].source.as_ref().expect("indicators loaded");
    assert_eq!(indicators.rows, 4);
    assert_eq!(indicators.delimiter, Some(','));
}
