// Opens a plain or gzipped (by extension) file and hands a BufRead to the parser.
// Must be expanded inside a function returning crate::core::error::Result.
macro_rules! read_compressed {
    ($file: ident, $function: expr $(, $param: expr )* ) => {{
        let file = std::fs::File::open($file)?;
        let reader = std::io::BufReader::new(file);

        match $file.extension().and_then(std::ffi::OsStr::to_str) {
            Some("gz") | Some("gzip") => {
                let reader = std::io::BufReader::new(flate2::bufread::MultiGzDecoder::new(reader));
                $function(reader $(, $param)*)
            }
            Some(_) | None => $function(reader $(, $param)*),
        }
    }};
}

pub(crate) use read_compressed;
