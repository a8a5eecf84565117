use clap::{arg,crate_version,Command};
use lzwin::lzss;

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    let long_help =
"Examples:
---------
Compress:      `lzwin compress -i document.txt -o document.lzs`
Expand:        `lzwin expand -i document.lzs -o document.txt`";

    let mut main_cmd = Command::new("lzwin")
        .about("Compress and expand with bounded-memory LZSS")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut f_in = std::fs::File::open(path_in)?;
        let mut f_out = std::fs::File::create(path_out)?;
        lzss::compress(&mut f_in,&mut f_out)?;
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut f_in = std::fs::File::open(path_in)?;
        let mut f_out = std::fs::File::create(path_out)?;
        lzss::expand(&mut f_in,&mut f_out)?;
    }

    Ok(())
}
