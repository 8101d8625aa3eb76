//! The `framehub` server binary.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use framehub::prelude::*;
use framehub::shutdown;

/// Wire encoding used for every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodecKind {
    Protobuf,
    Json,
}

/// What a game's clock does after waking up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TickPolicyKind {
    /// Drop the missed frames
    Skip,
    /// Fire missed frames back to back, up to --max-catchup
    CatchUp,
}

/// Lockstep relay server for multiplayer puzzle games.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    ip: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Capacity of the lobby and per-game inbound queues
    #[arg(long, default_value_t = 1024)]
    inbox_capacity: usize,

    /// Capacity of each session's outbound queue
    #[arg(long, default_value_t = 1024)]
    outbound_capacity: usize,

    /// Seconds a client may stay silent before it is dropped
    #[arg(long, default_value_t = 30)]
    read_timeout_secs: u64,

    /// Seconds a single write may take
    #[arg(long, default_value_t = 30)]
    write_timeout_secs: u64,

    /// Players a room needs before it can start
    #[arg(long, default_value_t = 1)]
    min_players: usize,

    /// Game frames per second
    #[arg(long, default_value_t = TickConfig::DEFAULT_TICK_RATE_HZ)]
    tick_rate: u32,

    /// Overrun handling for the game clock
    #[arg(long, value_enum, default_value_t = TickPolicyKind::Skip)]
    tick_policy: TickPolicyKind,

    /// Most missed frames replayed at once with --tick-policy catch-up
    #[arg(long, default_value_t = 3)]
    max_catchup: u32,

    /// Wire encoding
    #[arg(long, value_enum, default_value_t = CodecKind::Protobuf)]
    codec: CodecKind,
}

impl Args {
    fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            outbound_capacity: self.outbound_capacity,
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
        }
    }

    fn tick_policy(&self) -> TickPolicy {
        match self.tick_policy {
            TickPolicyKind::Skip => TickPolicy::Skip,
            TickPolicyKind::CatchUp => TickPolicy::CatchUp {
                max_catchup: self.max_catchup,
            },
        }
    }

    fn lobby_config(&self) -> LobbyConfig {
        LobbyConfig {
            inbox_capacity: self.inbox_capacity,
            min_players_to_start: self.min_players,
            game: GameConfig {
                inbox_capacity: self.inbox_capacity,
                tick: TickConfig {
                    policy: self.tick_policy(),
                    ..TickConfig::with_rate(self.tick_rate)
                },
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), FramehubError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.codec {
        CodecKind::Protobuf => serve(&args, ProtobufCodec).await,
        CodecKind::Json => serve(&args, JsonCodec).await,
    }
}

async fn serve<K: Codec>(args: &Args, codec: K) -> Result<(), FramehubError> {
    let server = FramehubServerBuilder::new()
        .bind(&args.addr())
        .session_config(args.session_config())
        .lobby_config(args.lobby_config())
        .build(codec)
        .await?;
    tracing::info!(addr = %server.local_addr()?, codec = ?args.codec, "listening");

    let (trigger, stop) = shutdown::channel();
    let run = server.run(stop);
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => return result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
            trigger.trigger();
        }
    }
    run.await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["framehub"]);
        assert_eq!(args.addr(), "0.0.0.0:8080");
        assert_eq!(args.codec, CodecKind::Protobuf);

        let session = args.session_config();
        assert_eq!(session.outbound_capacity, 1024);
        assert_eq!(session.read_timeout, Duration::from_secs(30));
        assert_eq!(session.write_timeout, Duration::from_secs(30));

        let lobby = args.lobby_config();
        assert_eq!(lobby.min_players_to_start, 1);
        assert_eq!(lobby.game.tick.tick_rate_hz, 30);
        assert_eq!(lobby.game.tick.policy, TickPolicy::Skip);
    }

    #[test]
    fn test_tick_flags() {
        let args = Args::parse_from([
            "framehub",
            "--tick-rate",
            "60",
            "--tick-policy",
            "catch-up",
            "--max-catchup",
            "5",
        ]);
        let tick = args.lobby_config().game.tick;
        assert_eq!(tick.tick_rate_hz, 60);
        assert_eq!(tick.policy, TickPolicy::CatchUp { max_catchup: 5 });
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "framehub",
            "--ip",
            "127.0.0.1",
            "--port",
            "9000",
            "--min-players",
            "2",
            "--read-timeout-secs",
            "5",
            "--codec",
            "json",
        ]);
        assert_eq!(args.addr(), "127.0.0.1:9000");
        assert_eq!(args.codec, CodecKind::Json);
        assert_eq!(args.lobby_config().min_players_to_start, 2);
        assert_eq!(args.session_config().read_timeout, Duration::from_secs(5));
    }
}
