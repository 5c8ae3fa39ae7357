use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use std::path::Path;
use std::process;
use websafe_score::{
    compute_score, CollectorConfig, DomainReputation, FactorSet, Preset, Reputation,
    SignalCollector, WeightProfile,
};

fn parse_reputation(raw: &str) -> Result<Reputation> {
    if let Ok(flag) = raw.parse::<bool>() {
        return Ok(Reputation::Boolean(flag));
    }
    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("reputation must be true, false or a number between 0 and 1"))?;
    Ok(Reputation::Numeric(value.clamp(0.0, 1.0)))
}

#[tokio::main]
async fn main() {
    let matches = Command::new("websafe-score")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Explainable website trust scoring")
        .long_about(
            "Scores a URL 0-100 from observed safety signals (TLS, reputation,\n\
             domain age, blocklists, external domain reputation and the URL text\n\
             itself) and prints a per-signal breakdown plus a confidence estimate.\n\
             Signals come from flags, or live collection with --collect.",
        )
        .arg(
            Arg::new("url")
                .value_name("URL")
                .help("URL to score")
                .required(true),
        )
        .arg(
            Arg::new("preset")
                .short('p')
                .long("preset")
                .value_name("NAME")
                .help("Weight preset: lenient, neutral or conservative")
                .default_value("neutral"),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .value_name("FILE")
                .help("Load a custom weight profile from a YAML file (overrides --preset)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("ssl")
                .long("ssl")
                .help("Treat the site as serving valid HTTPS (default: inferred from the URL scheme)")
                .action(ArgAction::SetTrue)
                .conflicts_with("no-ssl"),
        )
        .arg(
            Arg::new("no-ssl")
                .long("no-ssl")
                .help("Treat the site as not serving HTTPS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("reputation")
                .long("reputation")
                .value_name("VALUE")
                .help("Reputation evidence: true, false, or a score between 0 and 1")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("domain-age")
                .long("domain-age")
                .help("Mark the domain as established")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("blocklist")
                .long("blocklist")
                .help("Mark the site as blocklisted")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("penalties")
                .long("penalties")
                .value_name("N")
                .help("External reputation penalty count")
                .value_parser(clap::value_parser!(f64))
                .default_value("0"),
        )
        .arg(
            Arg::new("malware")
                .long("malware")
                .help("Mark the domain as a known malware distributor")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("phishing")
                .long("phishing")
                .help("Mark the domain as a known phishing domain")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("collect")
                .long("collect")
                .help("Gather signals live from the configured APIs instead of flags")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .help("Collect canned signals instead of touching the network (implies --collect)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the full result as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let mut builder = env_logger::Builder::from_default_env();
    if matches.get_flag("verbose") {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    let url = matches.get_one::<String>("url").unwrap();

    let weights = if let Some(path) = matches.get_one::<String>("profile") {
        match WeightProfile::load_from_file(Path::new(path)) {
            Ok(profile) => profile,
            Err(e) => {
                eprintln!("Failed to load weight profile {path}: {e}");
                process::exit(1);
            }
        }
    } else {
        let name = matches.get_one::<String>("preset").unwrap();
        match name.parse::<Preset>() {
            Ok(preset) => preset.profile(),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    };

    let (factors, domain_reputation) = if matches.get_flag("collect") || matches.get_flag("mock") {
        let config = CollectorConfig {
            use_mock: matches.get_flag("mock"),
            ..Default::default()
        };
        let collector = match SignalCollector::new(config) {
            Ok(collector) => collector,
            Err(e) => {
                eprintln!("Failed to build signal collector: {e}");
                process::exit(1);
            }
        };
        let signals = collector.collect(url).await;
        (signals.factors, signals.domain_reputation)
    } else {
        let ssl = if matches.get_flag("no-ssl") {
            false
        } else {
            matches.get_flag("ssl") || url.starts_with("https://")
        };
        let reputation = match matches.get_one::<String>("reputation") {
            Some(raw) => match parse_reputation(raw) {
                Ok(reputation) => reputation,
                Err(e) => {
                    eprintln!("{e}");
                    process::exit(1);
                }
            },
            None => Reputation::Boolean(false),
        };
        let factors = FactorSet {
            ssl,
            reputation,
            domain_age: matches.get_flag("domain-age"),
            blocklist: matches.get_flag("blocklist"),
        };
        let domain_reputation = DomainReputation {
            penalties: matches.get_one::<f64>("penalties").copied().unwrap_or(0.0),
            malware: matches.get_flag("malware"),
            phishing: matches.get_flag("phishing"),
        };
        (factors, domain_reputation)
    };

    let result = compute_score(&factors, &domain_reputation, url, &weights);

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&result) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("Failed to render result: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("URL:        {url}");
        println!("Score:      {}/100", result.score);
        println!("Confidence: {}/100", result.confidence);
        if result.raw_score != result.score {
            println!("Raw score:  {}", result.raw_score);
        }
        println!("Breakdown:");
        for signal in &result.breakdown {
            println!("  {:<16} {:>+4}  {}", signal.key, signal.delta, signal.note);
        }
    }
}
