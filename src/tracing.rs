use time::{format_description, UtcOffset};
use tracing_subscriber::{fmt, EnvFilter, FmtSubscriber};

// Sets up tracing. Goes to stderr, filtered by the TRACE env var, at info
// level when the var is unset (section progress and row warnings are part
// of the tool's normal diagnostics).
//
// EnvFilter has a standard syntax, but basically can be boiled down to
// (for example):
//
// All targets, info level:               info
// All modules under broker, debug level: tofx::broker=debug
// Global at info, broker as debug:       info,tofx::broker=debug
//
// More generally: target[span{field=value}]=level
// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn setup_tracing() {
    // Define the time format. 5 digits of precision is apparently good enough.
    let time_format =
        format_description::parse("[hour]:[minute]:[second].[subsecond digits:5]")
            .expect("Time format description is invalid");

    // Looking up the local offset fails once threads exist; UTC timestamps
    // are fine for diagnostics.
    let time_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(time_offset, time_format);

    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("TRACE")
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_timer(timer)
        .finish();

    // Set the subscriber as the default
    let _ = tracing::subscriber::set_global_default(subscriber);
}
