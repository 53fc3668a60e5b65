use clap::{App, Arg, ArgMatches, SubCommand};
use bufferhub::{
    error::BufferHubError, BrokerConfig, BufferBroker, BufferDescription, BufferUsage, PixelFormat,
    Result, SharedMemoryAllocator, MAX_CLIENTS_PER_BUFFER,
};
use std::{io, sync::Arc, time::Instant};

fn main() -> Result<()> {
    env_logger::init();

    let config_arg = Arg::with_name("config")
        .short("c")
        .long("config")
        .value_name("FILE")
        .help("Broker configuration (TOML)")
        .takes_value(true);

    let matches = App::new("bufferhub-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Shared graphics buffer broker CLI Tool")
        .subcommand(
            SubCommand::with_name("handoff")
                .about("Allocate a buffer and hand it to consumers through tokens")
                .arg(config_arg.clone())
                .arg(
                    Arg::with_name("width")
                        .short("w")
                        .long("width")
                        .value_name("WIDTH")
                        .help("Width in pixels, or bytes for blob buffers")
                        .default_value("640")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("height")
                        .short("y")
                        .long("height")
                        .value_name("HEIGHT")
                        .help("Height in pixels")
                        .default_value("480")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("blob")
                        .long("blob")
                        .help("Allocate an opaque byte buffer instead of an image"),
                )
                .arg(
                    Arg::with_name("consumers")
                        .short("n")
                        .long("consumers")
                        .value_name("COUNT")
                        .help("Number of consumers to import the buffer")
                        .default_value("2")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("metadata")
                        .short("m")
                        .long("metadata")
                        .value_name("BYTES")
                        .help("User metadata size")
                        .default_value("0")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("bench")
                .about("Measure token mint/import throughput")
                .arg(config_arg.clone())
                .arg(
                    Arg::with_name("operations")
                        .short("o")
                        .long("operations")
                        .value_name("OPS")
                        .help("Number of handoffs")
                        .default_value("10000")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("Print the diagnostic report of a sample broker")
                .arg(config_arg)
                .arg(
                    Arg::with_name("args")
                        .help("Extra arguments (ignored by the report)")
                        .multiple(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("info")
                .about("Show version and build information"),
        )
        .get_matches();

    match matches.subcommand() {
        ("handoff", Some(handoff_matches)) => handle_handoff(handoff_matches),
        ("bench", Some(bench_matches)) => handle_bench(bench_matches),
        ("dump", Some(dump_matches)) => handle_dump(dump_matches),
        ("info", Some(_)) => show_info(),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn build_broker(matches: &ArgMatches) -> Result<BufferBroker> {
    let config = match matches.value_of("config") {
        Some(path) => BrokerConfig::from_file(path)?,
        None => BrokerConfig::default(),
    };
    BufferBroker::with_config(Arc::new(SharedMemoryAllocator::new()), config)
}

fn parse_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    matches
        .value_of(name)
        .ok_or_else(|| BufferHubError::invalid_parameter(name, "Missing value"))?
        .parse()
        .map_err(|_| BufferHubError::invalid_parameter(name, "Invalid number"))
}

fn handle_handoff(matches: &ArgMatches) -> Result<()> {
    let broker = build_broker(matches)?;
    let width: u32 = parse_arg(matches, "width")?;
    let consumers: u32 = parse_arg(matches, "consumers")?;
    let metadata_size: usize = parse_arg(matches, "metadata")?;

    let description = if matches.is_present("blob") {
        BufferDescription::blob(width, BufferUsage::CPU_READ_OFTEN | BufferUsage::CPU_WRITE_OFTEN)
    } else {
        let height: u32 = parse_arg(matches, "height")?;
        BufferDescription::new(
            width,
            height,
            1,
            PixelFormat::RGBA_8888,
            BufferUsage::CPU_READ_OFTEN | BufferUsage::GPU_SAMPLED_IMAGE,
        )
    };

    let producer = broker.allocate(&description, metadata_size)?;
    println!(
        "Allocated buffer {:?} ({}, stride {}) for client {}",
        producer.client.buffer_id(),
        description.geometry(),
        producer.traits.description.stride,
        producer.client.id()
    );

    let mut imported = Vec::new();
    for _ in 0..consumers {
        let token = producer.client.duplicate()?;
        match broker.import(&token) {
            Ok(consumer) => {
                println!(
                    "  client {} imported slot {}",
                    consumer.client.id(),
                    consumer.client.slot().index()
                );
                imported.push(consumer.client);
            }
            Err(e) => {
                println!("  import refused: {} (status {:?})", e, e.status());
                break;
            }
        }
    }

    if let Some(first) = imported.first() {
        broker.close(first)?;
        println!("Closed client {}", first.id());
    }

    // Leave one token unused so it shows up in the report.
    producer.client.duplicate()?;

    println!();
    broker.dump(&mut io::stdout(), &[])
}

fn handle_bench(matches: &ArgMatches) -> Result<()> {
    let broker = build_broker(matches)?;
    let operations: usize = parse_arg(matches, "operations")?;

    let description = BufferDescription::blob(4096, BufferUsage::CPU_READ_OFTEN);
    let producer = broker.allocate(&description, 0)?.client;

    println!("Testing token handoff performance...");
    println!("Operations: {}", operations);

    let start = Instant::now();
    for _ in 0..operations {
        let token = producer.duplicate()?;
        let consumer = broker.import(&token)?.client;
        broker.close(&consumer)?;
    }
    let elapsed = start.elapsed();

    let ops_per_sec = operations as f64 / elapsed.as_secs_f64();
    let stats = broker.stats();
    println!("\nResults:");
    println!("  Total time: {:.2}ms", elapsed.as_millis());
    println!("  Handoffs/sec: {:.0}", ops_per_sec);
    println!("  Average latency: {:.2}μs", elapsed.as_micros() as f64 / operations.max(1) as f64);
    println!("  Import success rate: {:.2}%", stats.import_success_rate() * 100.0);
    println!("  Open clients: {}", stats.open_clients());
    Ok(())
}

fn handle_dump(matches: &ArgMatches) -> Result<()> {
    let broker = build_broker(matches)?;
    let args: Vec<String> = matches
        .values_of("args")
        .map(|values| values.map(String::from).collect())
        .unwrap_or_default();

    let image = BufferDescription::new(64, 64, 1, PixelFormat::RGBA_8888, BufferUsage::CPU_READ_OFTEN);
    let producer = broker.allocate(&image, 0)?.client;
    let _consumer = broker.import(&producer.duplicate()?)?.client;
    let _blob = broker
        .allocate(&BufferDescription::blob(4096, BufferUsage::CPU_WRITE_OFTEN), 0)?
        .client;
    producer.duplicate()?;

    broker.dump(&mut io::stdout(), &args)
}

fn show_info() -> Result<()> {
    println!("bufferhub v{}", bufferhub::VERSION);
    println!("Max clients per buffer: {}", MAX_CLIENTS_PER_BUFFER);
    println!("Default metadata backing: {}", bufferhub::BackingType::default().name());
    Ok(())
}
