use std::env;
use std::fs;
use std::path::PathBuf;

/// RP2350 memory map (4 MB flash on Pico 2 W).
const MEMORY_X: &str = r#"MEMORY {
    FLASH : ORIGIN = 0x10000000, LENGTH = 4096K
    RAM : ORIGIN = 0x20000000, LENGTH = 512K
    SRAM4 : ORIGIN = 0x20080000, LENGTH = 4K
    SRAM5 : ORIGIN = 0x20081000, LENGTH = 4K
}

SECTIONS {
    .start_block : ALIGN(4)
    {
        __start_block_addr = .;
        KEEP(*(.start_block));
        KEEP(*(.boot_info));
    } > FLASH
} INSERT AFTER .vector_table;

_stext = ADDR(.start_block) + SIZEOF(.start_block);

SECTIONS {
    .bi_entries : ALIGN(4)
    {
        __bi_entries_start = .;
        KEEP(*(.bi_entries));
        . = ALIGN(4);
        __bi_entries_end = .;
    } > FLASH
} INSERT AFTER .text;

SECTIONS {
    .end_block : ALIGN(4)
    {
        __end_block_addr = .;
        KEEP(*(.end_block));
    } > FLASH
} INSERT AFTER .uninit;

PROVIDE(start_to_end = __end_block_addr - __start_block_addr);
PROVIDE(end_to_start = __start_block_addr - __end_block_addr);
"#;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SPLITFLAP_UNITS");

    // Number of drums in this build (4 - 12 on the reference controller board)
    let units = env::var("SPLITFLAP_UNITS").unwrap_or_else(|_| "12".to_string());
    match units.parse::<u8>() {
        Ok(n) if (1..=12).contains(&n) => println!("cargo:rustc-env=SPLITFLAP_UNITS={}", n),
        _ => {
            println!(
                "cargo:warning=Ignoring invalid SPLITFLAP_UNITS={}, using 12",
                units
            );
            println!("cargo:rustc-env=SPLITFLAP_UNITS=12");
        }
    }

    // Linker setup only applies to the embedded binary
    if env::var_os("CARGO_FEATURE_PICO2_W").is_none() {
        return;
    }

    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out.join("memory.x"), MEMORY_X).expect("write memory.x");
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
