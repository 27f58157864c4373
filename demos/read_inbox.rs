// ABOUTME: Example application listing and printing every SMS stored on the SIM
// ABOUTME: Connects to a modem exposed over TCP, selects PDU mode and reads the whole inbox

use argh::FromArgs;
use modem_sms::client::{ClientBuilder, ClientConfig};
use modem_sms::config::{EngineConfig, SimType};
use modem_sms::{SmsRequest, SmsResponse};
use std::error::Error;
use std::time::Duration;

/// Read every message stored on the SIM of a network attached modem
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the hostname or IP address of the modem (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the TCP port of the modem's AT channel (default: 7000)
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// treat the SIM as a 2G card
    #[argh(switch)]
    gsm: bool,

    /// seconds to wait for each reply (default: 30)
    #[argh(option)]
    timeout: Option<u64>,
}

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let level = if cli_args.debugging {
        Level::TRACE
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(7000);
    let sim_type = if cli_args.gsm { SimType::Gsm } else { SimType::Usim };
    let timeout = Duration::from_secs(cli_args.timeout.unwrap_or(30));

    let mut client = ClientBuilder::new()
        .engine_config(EngineConfig::default().with_sim_type(sim_type))
        .client_config(ClientConfig::new(timeout))
        .connect(format!("{host}:{port}"))
        .await
        .map_err(|e| {
            eprintln!("Connection failed: {e}");
            Box::<dyn Error>::from(e.to_string())
        })?;

    if let SmsResponse::ServiceCenter {
        address: Some(address),
        ..
    } = client.execute(&SmsRequest::GetServiceCenter).await?
    {
        println!("Service centre: {}", address.as_str());
    }

    let messages = client.read_all().await?;
    println!("{} stored message(s)", messages.len());
    for message in messages {
        println!(
            "[{}] {:?} tpdu={}",
            message.sim_index,
            message.status,
            modem_sms::codec::bytes_to_hex(message.pdu.tpdu())
        );
    }

    Ok(())
}
