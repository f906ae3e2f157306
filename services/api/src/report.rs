use atm_siting::config::AppConfig;
use atm_siting::error::AppError;
use atm_siting::{CommuneAssessment, LayerStatus, SiteScoringService};
use clap::{ArgGroup, Args};

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("lookup")
        .required(true)
        .args(["lat", "commune"])
))]
pub(crate) struct ScoreArgs {
    /// Query latitude in decimal degrees
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub(crate) lat: Option<f64>,
    /// Query longitude in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub(crate) lng: Option<f64>,
    /// Commune name or code
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub(crate) commune: Option<String>,
    /// Print the assessment as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct LayersArgs {
    /// Print layer status as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

fn service_from_env() -> Result<SiteScoringService, AppError> {
    let config = AppConfig::load()?;
    Ok(SiteScoringService::new(config.data))
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let service = service_from_env()?;
    let assessment = match (args.lat, args.lng, args.commune.as_deref()) {
        (Some(lat), Some(lng), None) => service.score_by_coordinate(lat, lng)?,
        (None, None, Some(commune)) => service.score_by_key(commune)?,
        _ => {
            return Err(AppError::BadRequest(
                "provide either --lat/--lng or --commune".to_string(),
            ))
        }
    };

    if args.json {
        print_json(&assessment)
    } else {
        println!("{}", render_assessment(&assessment));
        Ok(())
    }
}

pub(crate) fn run_layers(args: LayersArgs) -> Result<(), AppError> {
    let statuses = service_from_env()?.layer_status();

    if args.json {
        print_json(&statuses)
    } else {
        println!("{}", render_layers(&statuses));
        Ok(())
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn render_assessment(assessment: &CommuneAssessment) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Commune: {}", assessment.commune));
    if let Some(code) = &assessment.commune_code {
        lines.push(format!("Code: {code}"));
    }
    lines.push(format!(
        "Centroid: {:.5}, {:.5}",
        assessment.latitude, assessment.longitude
    ));
    if let Some(distance) = assessment.distance_km {
        lines.push(format!("Distance from query: {distance:.2} km"));
    }
    lines.push(format!("Score: {:.2} / 100", assessment.result.score));
    lines.push(String::new());
    lines.push(format!(
        "{:<16} {:>10} {:>8} {:>13}",
        "factor", "value", "weight", "contribution"
    ));

    for (factor, weight) in &assessment.result.weights {
        let value = assessment.result.normalized.get(factor).copied().unwrap_or_default();
        let contribution = assessment
            .result
            .contributions
            .get(factor)
            .copied()
            .unwrap_or_default();
        lines.push(format!(
            "{:<16} {:>10.2} {:>8.2} {:>13.2}",
            factor.key(),
            value,
            weight,
            contribution
        ));
    }

    lines.join("\n")
}

pub(crate) fn render_layers(statuses: &[LayerStatus]) -> String {
    statuses
        .iter()
        .map(|status| match (&status.source, &status.error) {
            (Some(source), _) => format!(
                "{:<12} {} rows ({} dropped), {}, loaded {} from {}",
                status.layer,
                source.rows,
                source.dropped,
                source.encoding,
                source.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
                status.path.display()
            ),
            (None, Some(error)) => format!("{:<12} unavailable: {error}", status.layer),
            (None, None) => format!("{:<12} not loaded", status.layer),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
