use std::io::Write;
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
use std::ffi::OsString;

use clap::{crate_version, value_t, AppSettings, Arg, ArgMatches};
use log::info;

use treemirror::fetch::{Fetcher, LogProgress};
use treemirror::remote::{HttpTransport, RemoteOptions, RemoteTree, RetryPolicy};
use treemirror::repo::on_disk::OnDisk;

use crate::Result;

pub(crate) fn clap_app<'a, 'b>() -> clap::App<'a, 'b> {
    clap::App::new("treemirror")
        .version(crate_version!())
        .about("Mirror a remote repository tree into a local git object store")
        .setting(AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("url")
                .required(true)
                .help("URL of the repository API, e.g. https://gitlab.com/api/v4/projects/ID/repository"),
        )
        .arg(
            Arg::with_name("repo")
                .required(true)
                .help("Path to an existing local git repository"),
        )
        .arg(
            Arg::with_name("ref")
                .default_value("HEAD")
                .help("git reference to mirror"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log every request"),
        )
        .arg(
            Arg::with_name("init")
                .long("init")
                .help("Create an empty repository at <repo> if it has no .git directory"),
        )
        .arg(
            Arg::with_name("token")
                .long("token")
                .value_name("TOKEN")
                .takes_value(true)
                .help("Access token sent as PRIVATE-TOKEN"),
        )
        .arg(
            Arg::with_name("list-timeout")
                .long("list-timeout")
                .value_name("SECS")
                .default_value("15")
                .help("Timeout for each tree listing request"),
        )
        .arg(
            Arg::with_name("blob-timeout")
                .long("blob-timeout")
                .value_name("SECS")
                .default_value("60")
                .help("Timeout for each blob download"),
        )
        .arg(
            Arg::with_name("retries")
                .long("retries")
                .value_name("N")
                .default_value("3")
                .help("Attempts per request before giving up"),
        )
}

pub(crate) struct App<'a> {
    pub arg_matches: ArgMatches<'a>,
    pub stdout: &'a mut dyn Write,
}

impl<'a> App<'a> {
    pub fn run(&mut self) -> Result<()> {
        let matches = self.arg_matches.clone();
        // ^^ Need an independent copy of matches so we can still write
        // through `self` below.

        let url = matches.value_of("url").ok_or("missing <url>")?;
        let repo_path = matches.value_of("repo").ok_or("missing <repo>")?;
        let reference = matches.value_of("ref").unwrap_or("HEAD");

        let options = remote_options(&matches)?;
        let transport = HttpTransport::new(matches.value_of("token"))?;
        let remote = RemoteTree::new(transport, url, options)?;

        let repo = open_repo(Path::new(repo_path), matches.is_present("init"))?;

        let root = Fetcher::new(&repo, &remote, &LogProgress).fetch(reference, None, "/")?;

        writeln!(self, "{}", root)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn run_with_args<I, T>(args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut args: Vec<OsString> = args.into_iter().map(|x| x.into()).collect();
        args.insert(0, OsString::from("treemirror"));

        let mut stdout = Vec::new();

        App {
            arg_matches: clap_app().get_matches_from_safe(args)?,
            stdout: &mut stdout,
        }
        .run()?;

        Ok(stdout)
    }
}

impl<'a> Write for App<'a> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stdout.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stdout.flush()
    }
}

fn remote_options(matches: &ArgMatches) -> Result<RemoteOptions> {
    let list_timeout = value_t!(matches, "list-timeout", u64)?;
    let blob_timeout = value_t!(matches, "blob-timeout", u64)?;
    let attempts = value_t!(matches, "retries", u32)?;

    Ok(RemoteOptions {
        list_timeout: Duration::from_secs(list_timeout),
        blob_timeout: Duration::from_secs(blob_timeout),
        retry: RetryPolicy {
            attempts,
            ..RetryPolicy::default()
        },
    })
}

fn open_repo(path: &Path, init: bool) -> Result<OnDisk> {
    if init && !path.join(".git").exists() {
        info!("initializing empty repository in {}", path.display());
        return Ok(OnDisk::init(path)?);
    }

    Ok(OnDisk::new(path)?)
}
