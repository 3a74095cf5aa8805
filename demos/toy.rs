use std::collections::HashMap;

use clap::Parser;

use svm_driver::config::{DriverConfig, FaultPolicy};
use svm_driver::driver::Svm;
use svm_driver::engine::{Continuation, Explorer, MethodIdentifier, Summary};
use svm_driver::image::{Image, MethodHandle, Modifiers, ProgramImage, TypeDecl};
use svm_driver::selector::IgnoreList;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Ignore types whose qualified name contains this keyword.
    #[arg(long, value_name = "KEYWORD")]
    ignore: Vec<String>,

    /// Make the engine fail on this method.
    #[clap(long, value_name = "NAME")]
    fail: Vec<String>,

    /// Propagate engine failures instead of logging them.
    #[clap(long)]
    strict: bool,

    /// Verbose logging.
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct ToyError(String);

/// Engine that "explores" a method by returning a symbolic term named after it.
struct ToyExplorer {
    ids: HashMap<MethodHandle, MethodIdentifier>,
    names: HashMap<MethodIdentifier, String>,
    fail: Vec<String>,
    solver: Option<String>,
}

impl ToyExplorer {
    fn new(image: &Image, fail: Vec<String>) -> Self {
        let mut ids = HashMap::new();
        let mut names = HashMap::new();
        for (i, m) in image.types().iter().flat_map(|t| t.methods()).enumerate() {
            let id = MethodIdentifier::new(0x0600_0001 + i as u64);
            ids.insert(m.clone(), id);
            names.insert(id, m.to_string());
        }
        Self {
            ids,
            names,
            fail,
            solver: None,
        }
    }

    fn step(&self, id: MethodIdentifier) -> Result<Summary<String, Vec<String>>, ToyError> {
        let name = &self.names[&id];
        if self.fail.iter().any(|f| name.ends_with(f.as_str())) {
            return Err(ToyError(format!("engine gave up on {}", name)));
        }
        let solver = self.solver.as_deref().unwrap_or("none");
        let state = vec![
            format!("this ~> {}", name),
            format!("k ~> Closure@{}+4[Microsoft.FSharp.Core.Unit]", id.token() & 0xff),
            format!("solver ~> {}", solver),
        ];
        Ok(Summary::new(format!("μ[{}]", name), state))
    }
}

impl Explorer for ToyExplorer {
    type Term = String;
    type State = Vec<String>;
    type Solver = String;
    type Error = ToyError;

    fn make_method_identifier(&self, method: &MethodHandle) -> Option<MethodIdentifier> {
        self.ids.get(method).copied()
    }

    fn explore(&mut self, id: MethodIdentifier, k: Continuation<'_, Self>) -> Result<Summary<String, Vec<String>>, ToyError> {
        self.step(id).map(k)
    }

    fn interpret_entry_point(&mut self, id: MethodIdentifier, k: Continuation<'_, Self>) -> Result<Summary<String, Vec<String>>, ToyError> {
        self.step(id).map(k)
    }

    fn dump(&self, state: &Vec<String>) -> String {
        state.join("\n")
    }

    fn configure_solver(&mut self, solver: String) {
        self.solver = Some(solver);
    }
}

fn build_image() -> Image {
    let mut image = Image::new();
    image.add_type(
        TypeDecl::new("Toy.Lists", true)
            .with_method("Construct", Modifiers::PUBLIC)
            .with_method("Reverse", Modifiers::PUBLIC | Modifiers::STATIC)
            .with_method("IncN", Modifiers::NONE),
    );
    image.add_type(TypeDecl::new("Toy.Internal.Cache", true).with_method("Lookup", Modifiers::PUBLIC));
    image.add_type(TypeDecl::new("Toy.Hidden", false).with_method("Secret", Modifiers::PUBLIC));
    let main = image
        .add_type(TypeDecl::new("Toy.Program", true))
        .declare("Main", Modifiers::PUBLIC | Modifiers::STATIC);
    image.set_entry_point(main);
    image
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let image = build_image();
    let policy = if args.strict { FaultPolicy::Strict } else { FaultPolicy::Tolerant };
    let config = DriverConfig {
        methods: policy,
        entry_point: policy,
        require_solver: true,
    };

    let mut svm = Svm::new(ToyExplorer::new(&image, args.fail), config);
    svm.configure_solver("toy-smt".to_string());

    let time_total = std::time::Instant::now();
    let report = svm.run(&image, &IgnoreList::new(args.ignore))?;

    for (method, text) in report.iter() {
        println!("=== {}", method);
        println!("{}", text.unwrap_or("null"));
    }
    println!("{}", report.stats());
    println!("Total time: {:.3} s", time_total.elapsed().as_secs_f64());

    Ok(())
}
