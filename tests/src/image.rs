use std::fs;
use std::path::PathBuf;

use crate::harness::*;
use common::asm::{Reg, TrapVector};
use common::constants::PC_START;
use objfile::{ObjError, ObjFile};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lc3vm-{}-{name}", std::process::id()))
}

#[test]
fn run_from_file() {
    let mut words = assemble(&[
        lea(Reg::R0, 2),
        trap(TrapVector::Puts),
        halt(),
    ]);
    words.extend([b'o' as u16, b'k' as u16, 0]);
    let obj = ObjFile::new(PC_START, words).unwrap();

    let path = temp_path("ok.obj");
    let mut file = fs::File::create(&path).unwrap();
    obj.write_to(&mut file).unwrap();
    drop(file);

    let loaded = ObjFile::open(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(loaded, obj);

    let (mut emu, console) = load(&[]);
    emu.load_obj(&loaded);
    emu.run_at(loaded.origin).unwrap();
    assert_eq!(console.take_output_string(), "okHALT\n");
}

#[test]
fn later_images_overwrite() {
    let first = ObjFile::new(PC_START, assemble(&[
        add(Reg::R0, Reg::R0, imm(1)),
        add(Reg::R0, Reg::R0, imm(1)),
        halt(),
    ])).unwrap();
    let second = ObjFile::new(PC_START + 1, assemble(&[
        add(Reg::R1, Reg::R1, imm(5)),
    ])).unwrap();

    let (mut emu, _) = load(&[]);
    emu.load_obj(&first);
    emu.load_obj(&second);
    emu.run().unwrap();
    assert_eq!(emu.reg_read(Reg::R0), 1);
    assert_eq!(emu.reg_read(Reg::R1), 5);
}

#[test]
fn origin_entry() {
    let obj = ObjFile::from_bytes(&[0x40, 0x00, 0x10, 0x27, 0xf0, 0x25]).unwrap();
    assert_eq!(obj.origin, 0x4000);

    let (mut emu, _) = load(&[]);
    emu.load_obj(&obj);
    emu.run_at(obj.origin).unwrap();
    // add r0, r0, #7
    assert_eq!(emu.reg_read(Reg::R0), 7);
    assert_eq!(emu.pc(), 0x4002);
}

#[test]
fn loads_dont_touch_devices() {
    let obj = ObjFile::new(0xfdff, vec![1, 2, 3, 4]).unwrap();
    let (mut emu, console) = load(&[]);
    emu.load_obj(&obj);
    assert_eq!(emu.get_state().mem_read(0xfe00), 2);
    assert_eq!(emu.get_state().mem_read(0xfe02), 4);
    assert_eq!(console.num_polls(), 0);
}

#[test]
fn bad_images() {
    let path = temp_path("odd.obj");
    fs::write(&path, [0x30, 0x00, 0xf0]).unwrap();
    let res = ObjFile::open(&path);
    fs::remove_file(&path).unwrap();
    assert!(matches!(res, Err(ObjError::OddLength { len: 3 })));

    let res = ObjFile::from_bytes(&[0xff, 0xff, 0x00, 0x01, 0x00, 0x02]);
    assert!(matches!(res, Err(ObjError::Overflow { origin: 0xffff, words: 2 })));

    assert!(matches!(ObjFile::open(temp_path("missing.obj")), Err(ObjError::Io(_))));
}
