use crate::{
    query::Query,
    staging::{plan, Codec, ScratchDir, StagingMode},
};

fn scratch() -> ScratchDir {
    ScratchDir::new("$TMPDIR")
}

#[test]
pub fn disabled_keeps_query() {
    for query in ["sample.fastq.gz", "/data/notes.txt", "weird name;$(x)", ""] {
        let staging = plan(&Query::from(query), false, &scratch());

        assert_eq!(staging.mode, StagingMode::None);
        assert_eq!(staging.resolved_path, query);
        assert!(staging.staging_command.is_empty());
        assert!(!staging.needs_staging());
    }
}

#[test]
pub fn gzip_is_streamed() {
    let staging = plan(&Query::from("/data/run1/sample.fastq.gz"), true, &scratch());

    assert_eq!(staging.mode, StagingMode::Decompress(Codec::Gzip));
    assert_eq!(staging.resolved_path, "$TMPDIR/sample.fastq");
    assert_eq!(
        staging.staging_command,
        "gzip -dc /data/run1/sample.fastq.gz > $TMPDIR/sample.fastq"
    );
}

#[test]
pub fn bzip2_and_dsrc_are_streamed() {
    let bzip2 = plan(&Query::from("reads.fa.bz2"), true, &scratch());
    assert_eq!(bzip2.mode, StagingMode::Decompress(Codec::Bzip2));
    assert_eq!(bzip2.resolved_path, "$TMPDIR/reads.fa");
    assert_eq!(bzip2.staging_command, "bzip2 -dc reads.fa.bz2 > $TMPDIR/reads.fa");

    let dsrc = plan(&Query::from("reads.fastq.dsrc"), true, &scratch());
    assert_eq!(dsrc.mode, StagingMode::Decompress(Codec::Dsrc));
    assert_eq!(dsrc.resolved_path, "$TMPDIR/reads.fastq");
    assert_eq!(
        dsrc.staging_command,
        "dsrc d -s reads.fastq.dsrc > $TMPDIR/reads.fastq"
    );
}

#[test]
pub fn other_files_are_copied() {
    let staging = plan(&Query::from("/home/u/notes.txt"), true, &scratch());

    assert_eq!(staging.mode, StagingMode::Copy);
    assert_eq!(staging.resolved_path, "$TMPDIR/notes.txt");
    assert_eq!(staging.staging_command, "cp /home/u/notes.txt $TMPDIR/notes.txt");
}

#[test]
pub fn suffix_match_is_case_sensitive() {
    let staging = plan(&Query::from("sample.GZ"), true, &scratch());

    assert_eq!(staging.mode, StagingMode::Copy);
    assert_eq!(staging.resolved_path, "$TMPDIR/sample.GZ");
}

#[test]
pub fn only_the_final_suffix_is_stripped() {
    let staging = plan(&Query::from("archive.gz.bz2"), true, &scratch());

    assert_eq!(staging.mode, StagingMode::Decompress(Codec::Bzip2));
    assert_eq!(staging.resolved_path, "$TMPDIR/archive.gz");
}

#[test]
pub fn bare_suffix_keeps_its_name() {
    let staging = plan(&Query::from("data/.gz"), true, &scratch());

    assert_eq!(staging.resolved_path, "$TMPDIR/.gz");
}

#[test]
pub fn trailing_separators_use_the_last_component() {
    let staging = plan(&Query::from("dir/"), true, &scratch());
    assert_eq!(staging.resolved_path, "$TMPDIR/dir");
    assert_eq!(staging.staging_command, "cp dir/ $TMPDIR/dir");

    let staging = plan(&Query::from("/data/run1/"), true, &scratch());
    assert_eq!(staging.mode, StagingMode::Copy);
    assert_eq!(staging.resolved_path, "$TMPDIR/run1");
    assert_eq!(staging.staging_command, "cp /data/run1/ $TMPDIR/run1");

    let staging = plan(&Query::from("/data/reads.fq.gz/"), true, &scratch());
    assert_eq!(staging.mode, StagingMode::Decompress(Codec::Gzip));
    assert_eq!(staging.resolved_path, "$TMPDIR/reads.fq");
}

#[test]
pub fn scratch_dir_trailing_separators() {
    let staging = plan(&Query::from("a.txt"), true, &ScratchDir::new("/scratch//"));
    assert_eq!(staging.resolved_path, "/scratch/a.txt");

    let staging = plan(&Query::from("a.txt"), true, &ScratchDir::new("/"));
    assert_eq!(staging.resolved_path, "/a.txt");
}

#[test]
pub fn codec_detection() {
    assert_eq!(Codec::detect("x.gz"), Some((Codec::Gzip, ".gz")));
    assert_eq!(Codec::detect("x.bz2"), Some((Codec::Bzip2, ".bz2")));
    assert_eq!(Codec::detect("x.dsrc"), Some((Codec::Dsrc, ".dsrc")));
    assert_eq!(Codec::detect("x.gzip"), None);
    assert_eq!(Codec::Gzip.to_string(), "gzip");
}
