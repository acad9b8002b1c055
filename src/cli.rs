use clap::{App, Arg};

pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

pub fn build_app() -> App<'static, 'static> {
    App::new("polygon-iou")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compares predicted polygons against ground truth (area and object IoU)")
        .arg(
            Arg::with_name("ground-truth")
                .short("g")
                .long("ground-truth")
                .value_name("FILE")
                .help("Ground-truth polygon set (JSON)")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("predictions")
                .short("p")
                .long("predictions")
                .value_name("FILE")
                .help("Predicted polygon set (JSON)")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("threshold")
                .short("t")
                .long("threshold")
                .value_name("IOU")
                .help("Minimum IoU for a prediction to count as a true positive [default: 0.5]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("skip-area")
                .long("skip-area")
                .help("Do not compute the area-based metrics"),
        )
        .arg(
            Arg::with_name("skip-object")
                .long("skip-object")
                .help("Do not compute the object-based metrics"),
        )
        .arg(
            Arg::with_name("summary")
                .long("summary")
                .value_name("FILE")
                .help("Writes the summary table to FILE")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("scores")
                .long("scores")
                .value_name("FILE")
                .help("Writes the per-prediction IoU scores to FILE")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("overlap")
                .long("overlap")
                .value_name("FILE")
                .help("Writes the dissolved overlap geometry to FILE")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log-config")
                .long("log-config")
                .value_name("FILE")
                .help("log4rs configuration file")
                .takes_value(true)
                .default_value(DEFAULT_LOG_CONFIG),
        )
}
