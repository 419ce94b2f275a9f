//! Archive payload fixtures

use radioquery::SkyPosition;

/// Size of a FITS logical record
pub const BLOCK: usize = 2880;

/// The HTML page FIRST returns for positions outside its footprint
pub const FIRST_NO_DATA_PAGE: &str = "<html><head><title>FIRST Cutout</title></head>\
<body><h2>No FIRST data available at this position</h2></body></html>";

/// A quicklook directory listing in the archive's plain-text form
pub const VLASS_LISTING: &str = "\
[IMG] J000200-013000_qle123Imedian.fits 2025-02-17 08:35 106M
[IMG] J105000+303000_qle123Imedian.fits 2025-02-17 08:35 106M
[IMG] J110000+310000_qle123Imedian.fits 2025-02-17 08:35 106M
[IMG] J230000+450000_qle123Imedian.fits 2025-02-17 08:35 106M
";

/// A single-HDU FITS file with `blocks` data blocks, tagged so payloads can be told apart
pub fn fits_payload(blocks: usize, tag: u8) -> Vec<u8> {
    let mut header = String::new();
    for card in [
        "SIMPLE  =                    T",
        "BITPIX  =                    8",
        "NAXIS   =                    0",
        "END",
    ] {
        header.push_str(&format!("{card:<80}"));
    }
    let mut bytes = header.into_bytes();
    bytes.resize(BLOCK, b' ');
    bytes.resize(BLOCK * (blocks + 1), tag);
    bytes
}

/// Target used in the README examples
pub fn reference_target() -> SkyPosition {
    match SkyPosition::from_sexagesimal("10h50m07.270s", "+30d40m37.52s") {
        Ok(position) => position,
        Err(e) => panic!("reference target must parse: {e}"),
    }
}

/// Names of leftover temporary files in `dir`
pub fn temp_files(dir: &std::path::Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect(),
        Err(_) => Vec::new(),
    }
}
