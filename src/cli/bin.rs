use std::error::Error;
use std::io::{self, Write};

mod app;
pub(crate) use app::App;

pub(crate) type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("treemirror")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[allow(unused_must_use)]
#[cfg(not(tarpaulin_include))]
fn main() {
    // Keep as little as possible in here so the rest stays reachable
    // from tests.

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    let arg_matches = app::clap_app().get_matches();

    if let Err(err) = initialize_logger(arg_matches.is_present("verbose")) {
        eprintln!("WARNING: unable to initialize logging: {}", err);
    }

    let mut app = App {
        arg_matches,
        stdout: &mut stdout,
    };

    let r = app.run();

    app.flush();
    // Intentionally ignoring the result of this flush.

    std::process::exit(match r {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            1
        }
    });
}
