use anyhow::Context as _;
use clap::Parser;
use equinox::{
    Context, LocalServer,
    clock::build_configuration,
    database::WriteRequest,
    hardware::{LogRelay, drive_relay, press_button},
};
use tokio::io::{AsyncBufReadExt as _, BufReader};

/// Equinox Clock HomeKit accessory.
///
/// Reads commands from stdin to stand in for the physical button and for paired controllers:
/// `press`, `status`, `accessories`, `read <aid>.<iid>...`, `write <json>`.
#[derive(Parser)]
struct Args {
    /// Print the accessory database and exit
    #[arg(long)]
    dump_accessories: bool,

    /// Log filter, takes precedence over RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    equinox::log::init_with(args.log.as_deref());

    let context =
        Context::new(build_configuration()).context("invalid accessory configuration")?;

    let server = LocalServer::default();
    context
        .serve(&server)
        .await
        .context("failed to register accessories")?;

    let database = server
        .database()
        .context("server did not keep the attribute database")?;

    if args.dump_accessories {
        println!("{}", serde_json::to_string_pretty(&database.accessories_json())?);
        return Ok(());
    }

    tokio::spawn(drive_relay(LogRelay::default(), context.lights().clone()));

    tokio::spawn({
        let mut events = database.events();

        async move {
            use futures::StreamExt as _;

            while let Some(event) = events.next().await {
                match serde_json::to_string(&event) {
                    Ok(payload) => tracing::info!(%payload, "Event for paired controllers"),
                    Err(e) => tracing::error!("Failed to serialize event: {e}"),
                }
            }
        }
    });

    tokio::spawn({
        let mut requests = database.identify_requests();

        async move {
            while let Ok(aid) = requests.recv().await {
                tracing::info!(aid, "Identifying");
            }
        }
    });

    tracing::info!(setup_code = %context.configuration().setup_code(), "Accessory running");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let (command, rest) = line.trim().split_once(' ').unwrap_or((line.trim(), ""));

        match command {
            "" => {}
            "press" => {
                let on = press_button(context.lights());
                println!("lights {}", if on { "on" } else { "off" });
            }
            "status" => {
                println!("lights {}", if context.lights().get_value() { "on" } else { "off" });
            }
            "accessories" => {
                println!("{}", serde_json::to_string_pretty(&database.accessories_json())?);
            }
            "read" => match parse_ids(rest) {
                Some(ids) => {
                    println!("{}", serde_json::to_string(&database.read_request(&ids))?);
                }
                None => eprintln!("usage: read <aid>.<iid>[,<aid>.<iid>...]"),
            },
            "write" => match serde_json::from_str::<WriteRequest>(rest) {
                Ok(request) => match database.write_request(&request) {
                    None => println!("ok"),
                    Some(response) => println!("{}", serde_json::to_string(&response)?),
                },
                Err(e) => eprintln!("bad write request: {e}"),
            },
            _ => eprintln!("unknown command: {command}"),
        }
    }

    Ok(())
}

/// Parse `1.9,1.10` into `(aid, iid)` pairs.
fn parse_ids(ids: &str) -> Option<Vec<(u64, u64)>> {
    ids.split(',')
        .map(|id| {
            let (aid, iid) = id.trim().split_once('.')?;
            Some((aid.parse().ok()?, iid.parse().ok()?))
        })
        .collect()
}
