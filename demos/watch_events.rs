// ABOUTME: Example application printing SMS related notifications as the modem reports them
// ABOUTME: Reads newly stored messages as soon as their storage notice arrives

use argh::FromArgs;
use modem_sms::client::ClientBuilder;
use modem_sms::notification::{NotificationEvent, StoredKind};
use modem_sms::SmsResponse;
use std::error::Error;
use std::time::Duration;

/// Watch a modem for incoming messages and status changes
#[derive(FromArgs)]
struct CliArgs {
    /// the hostname or IP address of the modem (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the TCP port of the modem's AT channel (default: 7000)
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// stop after this many seconds without a notification
    #[argh(option)]
    idle: Option<u64>,
}

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than TRACE (e.g, debug, info, warn, etc.)
        // will be written to stdout.
        .with_max_level(Level::TRACE)
        // completes the builder.
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(7000);

    let mut client = ClientBuilder::new()
        .connect(format!("{host}:{port}"))
        .await?;
    println!("Watching {host}:{port}");

    loop {
        let event = match cli_args.idle {
            Some(secs) => match client.next_event_within(Duration::from_secs(secs)).await {
                Ok(event) => event,
                Err(e) => {
                    println!("Stopping: {e}");
                    break;
                }
            },
            None => client.next_event().await?,
        };
        let Some(event) = event else {
            println!("Modem closed the channel");
            break;
        };

        match event {
            NotificationEvent::MessageStored {
                kind: StoredKind::Message,
                index,
                ..
            } => match client.read_message(index).await? {
                SmsResponse::Read {
                    message: Some(message),
                    ..
                } => println!("New message at {index}: {:?}", message.pdu),
                other => println!("New message at {index} unreadable: {:?}", other.result()),
            },
            NotificationEvent::IncomingMessage(pdu) => {
                println!("Incoming message of {} octets", pdu.msg_length())
            }
            other => println!("{other:?}"),
        }
    }

    Ok(())
}
