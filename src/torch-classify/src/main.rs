use std::error::Error;
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;
use torch_serve::preprocess::Interpolation;
use torch_serve::ImageClassifier;

use log::info;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "torch-classify",
    about = "CLI app to perform image classification with a TorchScript model"
)]
struct CmdArgs {
    #[structopt(parse(from_os_str), help = "Path to the TorchScript model file")]
    model_path: PathBuf,

    #[structopt(parse(from_os_str), help = "Path to the index->name JSON mapping")]
    labels_path: PathBuf,

    #[structopt(parse(from_os_str), help = "Image file to classify")]
    image_path: PathBuf,

    #[structopt(short = "k", long, default_value = "6", help = "Number of labels to report")]
    top_k: usize,

    #[structopt(
        long,
        help = "Treat the input file as an invocation body ('<meta>;<meta>,<base64>')"
    )]
    data_uri: bool,

    #[structopt(long, help = "Antialias when downscaling the image to 224x224")]
    antialias: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CmdArgs::from_args();

    if args.top_k == 0 {
        return Err("--top-k must be a positive integer".into());
    }

    let interpolation = if args.antialias {
        Interpolation::BilinearAntialias
    } else {
        Interpolation::Bilinear
    };

    let classifier = ImageClassifier::load(&args.model_path, &args.labels_path, args.top_k)?
        .with_interpolation(interpolation);
    info!(
        "Classifying {} against {} labels",
        args.image_path.display(),
        classifier.labels().len()
    );

    let predictions = if args.data_uri {
        let body = fs::read_to_string(&args.image_path)?;
        classifier.classify_from_data_uri(body.trim())?
    } else {
        classifier.classify_from_raw(&fs::read(&args.image_path)?)?
    };

    println!("{}", serde_json::to_string(&predictions)?);

    Ok(())
}
