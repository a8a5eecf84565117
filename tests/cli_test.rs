use assert_cmd::prelude::*; // Add methods on commands
use std::process::Command; // Run programs
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Write `data` to a temp file, run it through compress then expand with
/// the real binary, and check the result against the original.
fn roundtrip_test(data: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original");
    let packed_path = temp_dir.path().join("packed.lzs");
    let out_path = temp_dir.path().join("expanded");
    std::fs::write(&in_path,data)?;
    let mut cmd = Command::cargo_bin("lzwin")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("lzwin")?;
    cmd.arg("expand")
        .arg("-i").arg(&packed_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    match (std::fs::read(&in_path),std::fs::read(&out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare files")
    }
    Ok(())
}

#[test]
fn text_roundtrip() -> STDRESULT {
    let text = "What's in a name? That which we call a rose \
by any other name would smell as sweet.\n".repeat(64);
    roundtrip_test(text.as_bytes())
}

#[test]
fn binary_roundtrip() -> STDRESULT {
    let mut data = Vec::new();
    for i in 0u32..5000 {
        data.push((i.wrapping_mul(2654435761) >> 24) as u8);
    }
    roundtrip_test(&data)
}

#[test]
fn empty_roundtrip() -> STDRESULT {
    roundtrip_test(&[])
}

#[test]
fn known_stream() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original");
    let packed_path = temp_dir.path().join("packed.lzs");
    std::fs::write(&in_path,[b'A';18])?;
    let mut cmd = Command::cargo_bin("lzwin")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .assert()
        .success();
    assert_eq!(std::fs::read(&packed_path)?,hex::decode("a0801f0000").unwrap());
    Ok(())
}

#[test]
fn missing_input_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("lzwin")?;
    cmd.arg("compress")
        .arg("-i").arg(temp_dir.path().join("no_such_file"))
        .arg("-o").arg(temp_dir.path().join("out"))
        .assert()
        .failure();
    Ok(())
}
