#[cfg(feature = "cli")]
fn main() -> miette::Result<()> {
    use std::{error::Error, io::Write};

    use clap::Parser;
    use log::{debug, LevelFilter};
    use miette::IntoDiagnostic;
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
    use templatify::{Args, Param, Renderer, Templatify};

    /// Render a template with the given values, escaping them on the way in.
    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    struct Options {
        /// Template, with `{name}`, `{}` or `{0}` placeholders
        template: String,

        /// Characters to escape in the template text and in values
        #[arg(short, long, default_value = "")]
        escape: String,

        /// Use values from the environment
        #[arg(long)]
        env: bool,

        /// Key-value pairs to use
        #[arg(short, long, value_parser = parse_key_val::<String, String>)]
        values: Vec<(String, String)>,

        /// Positional values, for `{}` and `{0}` placeholders
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// Utility log level
        #[arg(long, default_value = "warn")]
        log_level: LevelFilter,
    }

    /// Parse a single key-value pair
    fn parse_key_val<T, U>(s: &str) -> Result<(T, U), Box<dyn Error + Send + Sync + 'static>>
    where
        T: std::str::FromStr,
        T::Err: Error + Send + Sync + 'static,
        U: std::str::FromStr,
        U::Err: Error + Send + Sync + 'static,
    {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
        Ok((k.parse()?, v.parse()?))
    }

    let opts = Options::parse();

    let mut log_config = ConfigBuilder::new();
    log_config.set_location_level(LevelFilter::Off);
    TermLogger::init(
        opts.log_level,
        log_config.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .into_diagnostic()?;

    let renderer: Renderer = Templatify::new().escape(opts.escape).declare(
        Some(opts.template.as_str()),
        [Param::var_positional("args"), Param::var_keyword("values")],
    )?;
    debug!("{renderer:?}");

    let mut args = opts.args.into_iter().fold(Args::new(), Args::arg);
    for (key, value) in opts.values {
        args = args.kwarg(key, value);
    }
    if opts.env {
        for (key, value) in std::env::vars() {
            if !args.named.contains_key(&key) {
                args = args.kwarg(key, value);
            }
        }
    }

    let rendered = renderer.render(args)?;
    writeln!(std::io::stdout().lock(), "{rendered}").into_diagnostic()?;
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {}
