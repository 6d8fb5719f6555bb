mod common;

use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::*;

macro_rules! cargo_run {
    ($cmd:expr, $($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin($cmd)?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

#[test]
fn add_and_list() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let images = assert_fs::TempDir::new()?;
    common::write_samples(images.path());
    std::fs::write(images.path().join("notes.txt"), "not an image")?;

    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", images.path()).success();

    cargo_run!("imsimilar", "-c", conf_dir.path(), "list", "--count", "2")
        .success()
        .stdout(predicate::str::contains("checker.png"))
        .stdout(predicate::str::contains("diagonal.png"))
        .stdout(predicate::str::contains("vertical.png").not());

    Ok(())
}

#[test]
fn broken_image_is_skipped() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let images = assert_fs::TempDir::new()?;
    common::write_samples(images.path());
    std::fs::write(images.path().join("broken.png"), "not an image")?;

    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", images.path()).success();
    cargo_run!("imsimilar", "-c", conf_dir.path(), "list")
        .success()
        .stdout(predicate::str::contains("broken.png").not());

    Ok(())
}

#[rstest]
#[case::average("average")]
#[case::difference("difference")]
fn search_external_image(#[case] hash: &str) -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let images = assert_fs::TempDir::new()?;
    let query = assert_fs::TempDir::new()?;
    common::write_samples(images.path());
    common::write_samples(query.path());

    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", "-H", hash, images.path()).success();

    let probe = query.path().join("diagonal.png");
    let expected = images.path().canonicalize()?.join("diagonal.png");
    cargo_run!("imsimilar", "-c", conf_dir.path(), "search", "-H", hash, "--count", "1", &probe)
        .success()
        .stdout(predicate::str::starts_with(format!("0\t{}", expected.display())));

    Ok(())
}

#[test]
fn similar_existing_image() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let images = assert_fs::TempDir::new()?;
    common::write_samples(images.path());

    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", images.path()).success();

    let identifier = images.path().canonicalize()?.join("checker.png");
    cargo_run!(
        "imsimilar",
        "-c",
        conf_dir.path(),
        "similar",
        "--output-format",
        "json",
        &identifier
    )
    .success()
    .stdout(predicate::str::contains("\"distance\": 0"));

    cargo_run!("imsimilar", "-c", conf_dir.path(), "similar", "--exec", "copy-path", "--count", "1", &identifier)
        .success()
        .stdout(predicate::str::diff(format!("{}\n", identifier.display())));

    Ok(())
}

#[test]
fn similar_missing_image() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;

    cargo_run!("imsimilar", "-c", conf_dir.path(), "similar", "missing.png")
        .failure()
        .stderr(predicate::str::contains("not found"));

    Ok(())
}

#[test]
fn search_not_an_image() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let file = assert_fs::NamedTempFile::new("fake.png")?;
    std::fs::write(file.path(), "plain text")?;

    cargo_run!("imsimilar", "-c", conf_dir.path(), "search", file.path())
        .failure()
        .stderr(predicate::str::contains("failed to decode image"));

    Ok(())
}

#[test]
fn hash_algorithm_mismatch() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let images = assert_fs::TempDir::new()?;
    common::write_samples(images.path());

    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", images.path()).success();
    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", "-H", "difference", images.path())
        .failure()
        .stderr(predicate::str::contains("哈希算法不一致"));

    Ok(())
}

#[test]
fn add_strict_twice() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let images = assert_fs::TempDir::new()?;
    common::write_samples(images.path());

    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", "--strict", images.path()).success();
    cargo_run!("imsimilar", "-c", conf_dir.path(), "add", "--strict", images.path())
        .failure()
        .stderr(predicate::str::contains("already exists"));

    // 失败的写入不应改变已有记录
    cargo_run!("imsimilar", "-c", conf_dir.path(), "list")
        .success()
        .stdout(predicate::str::contains("checker.png"));

    Ok(())
}

#[test]
fn add_relative_path() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let workdir = assert_fs::TempDir::new()?;
    let images = workdir.path().join("imgs");
    std::fs::create_dir(&images)?;
    common::write_samples(&images);

    Command::cargo_bin("imsimilar")?
        .current_dir(workdir.path())
        .arg("-c")
        .arg(conf_dir.path())
        .args(["add", "./imgs"])
        .assert()
        .success();

    let expected = images.canonicalize()?.join("checker.png");
    cargo_run!("imsimilar", "-c", conf_dir.path(), "similar", "--count", "1", &expected)
        .success()
        .stdout(predicate::str::diff(format!("0\t{}\n", expected.display())));

    Ok(())
}
