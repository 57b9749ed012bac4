#![no_main]

use libfuzzer_sys::fuzz_target;
use timeline_md::parser::parse_cell;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Errors are expected; panics and hangs are not.
    if let Ok(entries) = timeline_md::parse_entries(source) {
        for entry in &entries {
            let markdown = entry.description.to_markdown();
            let reparsed = parse_cell(&markdown).expect("serialized description parses");
            assert_eq!(markdown, reparsed.to_markdown());
        }
    }
});
