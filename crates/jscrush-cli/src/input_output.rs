use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read},
};

fn squash_standard_io(path: &Option<String>) -> Option<String> {
    match path {
        Some(p) if p == "-" => None,
        Some(p) => Some(p.clone()),
        None => None,
    }
}

/// Input argument group: an optional input file, `"-"` or absent meaning
/// stdin.
#[derive(clap::Args, Debug)]
pub struct InputArgs {
    /// Input file; "-" or omitted reads from stdin.
    #[clap(long, default_value = None)]
    pub input: Option<String>,
}

impl InputArgs {
    /// Open a buffered reader for the configured input.
    pub fn open_reader(&self) -> Result<Box<dyn BufRead>, Box<dyn std::error::Error>> {
        Ok(match squash_standard_io(&self.input) {
            None => Box::new(BufReader::new(std::io::stdin().lock())),
            Some(p) => Box::new(BufReader::new(File::open(p)?)),
        })
    }

    /// Read the whole input into a `String`.
    pub fn read_to_string(&self) -> Result<String, Box<dyn std::error::Error>> {
        let mut reader = self.open_reader()?;
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Ok(buf)
    }
}

/// Output argument group: an optional output file, `"-"` or absent
/// meaning stdout.
#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Output file; "-" or omitted writes to stdout.
    #[clap(long, default_value = None)]
    pub output: Option<String>,
}

impl OutputArgs {
    /// Open a buffered writer for the configured output.
    pub fn open_writer(&self) -> Result<Box<dyn std::io::Write>, Box<dyn std::error::Error>> {
        Ok(match squash_standard_io(&self.output) {
            Some(p) => Box::new(BufWriter::new(File::create(p)?)),
            None => Box::new(BufWriter::new(std::io::stdout().lock())),
        })
    }
}
