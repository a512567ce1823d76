use anyhow::{anyhow, Context};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::convert::TryFrom;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use assoc::{
    CategorySet, ColumnDefinition, ConsequenceCategory, CsvExporter, DataLayout, EngineConfig, FilterState,
    GeneResultsTable, GeneSearch, Lookup, Metadata, RecordDecoder, ResultsPayload, SortOrder, SortState,
    VariantTable, VariantsPayload, export_file_name,
};

fn app<'a, 'b>() -> clap::App<'a, 'b> {
    let dataset = Arg::with_name("dataset")
        .long("--dataset")
        .required(true)
        .takes_value(true)
        .help("Dataset name from metadata.json");
    let group = Arg::with_name("group")
        .long("--group")
        .takes_value(true)
        .help("Analysis group, defaults to the dataset's default group");
    let search = Arg::with_name("search")
        .long("--search")
        .takes_value(true);
    let output = Arg::with_name("output")
        .long("--output")
        .short("o")
        .takes_value(true)
        .help("Write CSV to this file, or a timestamped file in this directory");
    let table = Arg::with_name("table")
        .long("--table")
        .conflicts_with("output")
        .help("Print formatted cells instead of CSV");

    App::new("assoc")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("data_dir")
            .long("--data-dir")
            .takes_value(true)
            .global(true)
            .help("Directory holding metadata.json, results/ and genes/"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .global(true))
        .subcommand(SubCommand::with_name("search")
            .about("Search genes by symbol, alias or id prefix")
            .arg(Arg::with_name("query")
                .required(true)
                .index(1)))
        .subcommand(SubCommand::with_name("variants")
            .about("Filter, sort and export the variants in a gene")
            .arg(Arg::with_name("gene")
                .required(true)
                .index(1)
                .help("Gene id or exact gene symbol"))
            .arg(dataset.clone())
            .arg(group.clone())
            .arg(search.clone())
            .arg(output.clone())
            .arg(table.clone())
            .arg(Arg::with_name("categories")
                .long("--categories")
                .takes_value(true)
                .use_delimiter(true)
                .possible_values(&["lof", "missense", "synonymous", "other"]))
            .arg(Arg::with_name("custom")
                .long("--custom")
                .takes_value(true)
                .help("JSON value for the dataset's custom filter"))
            .arg(Arg::with_name("sort")
                .long("--sort")
                .takes_value(true))
            .arg(Arg::with_name("order")
                .long("--order")
                .takes_value(true)
                .possible_values(&["asc", "desc"])))
        .subcommand(SubCommand::with_name("results")
            .about("Export the gene results table")
            .arg(dataset)
            .arg(group)
            .arg(search)
            .arg(output)
            .arg(table)
            .arg(Arg::with_name("sort")
                .long("--sort")
                .takes_value(true)))
}

fn main() {
    let matches = app().get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(io::stderr)
        .compact()
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn run(args: &ArgMatches) -> anyhow::Result<()> {
    let (name, sub) = match args.subcommand() {
        (name, Some(sub)) => (name, sub),
        _ => return Err(anyhow!("no subcommand given")),
    };
    let data_dir = sub.value_of("data_dir")
        .or_else(|| args.value_of("data_dir"))
        .ok_or_else(|| anyhow!("--data-dir is required"))?;
    let layout = DataLayout::new(data_dir);

    match name {
        "search" => search(&layout, sub),
        "variants" => variants(&layout, sub),
        "results" => results(&layout, sub),
        other => Err(anyhow!("unknown subcommand {}", other)),
    }
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn load_search(layout: &DataLayout) -> anyhow::Result<GeneSearch> {
    let search = GeneSearch::from_reader(open(&layout.search_terms())?)
        .context("failed to index gene search terms")?;
    Ok(search)
}

fn load_config(layout: &DataLayout, args: &ArgMatches) -> anyhow::Result<EngineConfig> {
    let dataset = args.value_of("dataset").ok_or_else(|| anyhow!("missing --dataset"))?;
    let metadata = Metadata::from_reader(open(&layout.metadata())?)
        .context("failed to read metadata")?;
    Ok(metadata.dataset_config(dataset)?)
}

/// Writes CSV to `--output` or to stdout. A directory gets a timestamped file.
fn write_csv<F>(args: &ArgMatches, base: &str, write: F) -> anyhow::Result<()>
    where F: FnOnce(&mut dyn Write) -> assoc::Result<()>
{
    match args.value_of("output") {
        Some(output) => {
            let mut path = Path::new(output).to_path_buf();
            if path.is_dir() {
                path.push(export_file_name(base, &chrono::Local::now()));
            }
            let mut file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write(&mut file)?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write(&mut handle)?;
        }
    }
    Ok(())
}

fn print_table<T: Lookup>(columns: &[ColumnDefinition], rows: &[T]) {
    let headings: Vec<&str> = columns.iter().map(ColumnDefinition::heading).collect();
    println!("{}", headings.join("\t"));
    for row in rows {
        let cells: Vec<String> = columns.iter()
            .map(|column| column.render.render(&row.lookup(&column.key)))
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn search(layout: &DataLayout, args: &ArgMatches) -> anyhow::Result<()> {
    let query = args.value_of("query").ok_or_else(|| anyhow!("missing query"))?;
    let search = load_search(layout)?;
    for hit in search.search(query) {
        println!("{}\t{}", hit.label, hit.url);
    }
    Ok(())
}

fn filter_from_args(args: &ArgMatches, base: FilterState) -> anyhow::Result<FilterState> {
    let mut filter = base;
    if let Some(values) = args.values_of("categories") {
        let mut categories = CategorySet::none();
        for value in values {
            let category = ConsequenceCategory::try_from(value)
                .map_err(|_| anyhow!("unknown consequence category {}", value))?;
            categories = categories.with(category, true);
        }
        filter = filter.with_categories(categories);
    }
    if let Some(text) = args.value_of("search") {
        filter = filter.with_search_text(text);
    }
    if let Some(custom) = args.value_of("custom") {
        let custom = serde_json::from_str(custom).context("--custom is not valid JSON")?;
        filter = filter.with_custom(custom);
    }
    Ok(filter)
}

fn variants(layout: &DataLayout, args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(layout, args)?;
    let gene = args.value_of("gene").ok_or_else(|| anyhow!("missing gene"))?;
    let gene_id = load_search(layout)?.resolve(gene)?;

    let path = layout.gene_variants(&gene_id, &config.dataset_id)?;
    let payload = VariantsPayload::from_reader(open(&path)?)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let variants = RecordDecoder::new(&config).decode_variants(&payload)?;

    let table = VariantTable::new(&config, variants);
    let mut state = table.initial_state()?;
    if let Some(group) = args.value_of("group") {
        state = table.change_group(state, group)?;
    }
    let filter = filter_from_args(args, state.filter.clone())?;
    state = table.change_filter(state, filter)?;
    if let Some(key) = args.value_of("sort") {
        let order = match args.value_of("order").map(SortOrder::try_from) {
            Some(Ok(order)) => order,
            _ => SortOrder::Descending,
        };
        state = table.apply_sort(state, SortState::new(key, order))?;
    }
    tracing::info!("{} variants in {} for {}", state.rows.len(), gene_id, state.group);

    if args.is_present("table") {
        print_table(table.columns(), &state.rows);
        return Ok(());
    }
    let base = format!("{}_{}_variants", state.group, gene_id);
    let columns = table.columns().to_vec();
    write_csv(args, &base, |writer| CsvExporter::new(columns, state.rows.iter()).write_all(writer))
}

fn results(layout: &DataLayout, args: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(layout, args)?;
    let path = layout.gene_results(&config.dataset_id);
    let payload = ResultsPayload::from_reader(open(&path)?)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let genes = RecordDecoder::new(&config).decode_genes(&payload)?;

    let table = GeneResultsTable::new(&config, genes);
    let mut state = table.initial_state()?;
    if let Some(group) = args.value_of("group") {
        state = table.change_group(state, group)?;
    }
    if let Some(text) = args.value_of("search") {
        state = table.change_search(state, text);
    }
    if let Some(key) = args.value_of("sort") {
        state = table.request_sort(state, key)?;
    }

    if args.is_present("table") {
        print_table(table.columns(), &state.rows);
        return Ok(());
    }
    let base = format!("{}_results", state.group);
    let columns = table.columns().to_vec();
    write_csv(args, &base, |writer| CsvExporter::new(columns, state.rows.iter()).write_all(writer))
}
