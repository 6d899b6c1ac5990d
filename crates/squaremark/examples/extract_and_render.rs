use squaremark::{
    render_markers, DocumentFormat, ExtractConfig, Extractor, OrientationWeights, RenderOptions,
};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <image.png> <out.svg|out.eps> [markers.json]", args[0]);
        std::process::exit(2);
    }

    let image = image::open(&args[1])?.to_luma32f();
    let config = ExtractConfig {
        orient: Some(OrientationWeights::default()),
        ..Default::default()
    };
    let markers = Extractor::new(config).extract(&image)?;
    println!("Extracted {} markers.", markers.markers.len());

    let options = RenderOptions {
        use_mean_radius: true,
        frame_margin: 1.1,
        ..Default::default()
    };
    let doc = render_markers(&markers.markers, &options)?;
    let out = Path::new(&args[2]);
    std::fs::write(out, doc.serialize(DocumentFormat::from_path(out)))?;
    println!("Wrote {}", out.display());

    if let Some(json_path) = args.get(3) {
        markers.write_json_file(Path::new(json_path))?;
        println!("Wrote {json_path}");
    }
    Ok(())
}
