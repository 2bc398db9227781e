#[cfg(test)]
mod tests {
    use crate::config::ConverterConfig;
    use crate::registry::*;
    use convert_core::mocks::MockGateway;
    use convert_core::{
        ConversionRequest, ConverterError, ConverterRegistry, JobInput, Operation, UploadKind,
    };
    use convert_types::SpecialOp;
    use std::path::PathBuf;
    use uuid::Uuid;

    struct Harness {
        dir: tempfile::TempDir,
        gateway: MockGateway,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                gateway: MockGateway::new(),
            }
        }

        fn registry(&self, commands: &[(&str, &str)], timeout_secs: u64) -> ProcessRegistry<MockGateway> {
            let config = ConverterConfig {
                work_dir: self.dir.path().to_path_buf(),
                timeout_secs,
                commands: commands
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            ProcessRegistry::new(self.gateway.clone(), &config)
        }

        fn input_file(&self, name: &str, content: &str) -> JobInput {
            let path = self.dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            JobInput::File {
                path,
                file_name: name.to_string(),
            }
        }

        fn request(&self, operation: Operation, input: JobInput) -> ConversionRequest {
            ConversionRequest {
                job_id: Uuid::new_v4(),
                operation,
                input,
                work_dir: self.dir.path().to_path_buf(),
                chat_id: 77,
                reply_to: 12,
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }
    }

    // ── built-in operations ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_send_photo_reuploads_input() {
        let h = Harness::new();
        let input = h.input_file("scan.png", "png");
        let request = h.request(
            Operation::Special {
                op: SpecialOp::SendPhoto,
            },
            input,
        );

        h.registry(&[], 5).run(request).await.unwrap();

        let uploads = h.gateway.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].kind, UploadKind::Photo);
        assert_eq!(uploads[0].path, h.path("scan.png"));
        assert_eq!(uploads[0].chat_id, 77);
        assert_eq!(uploads[0].reply_to, Some(12));
    }

    #[tokio::test]
    async fn test_send_vid_uploads_as_video() {
        let h = Harness::new();
        let input = h.input_file("clip.mkv", "mkv");
        let request = h.request(
            Operation::Special {
                op: SpecialOp::SendVid,
            },
            input,
        );

        h.registry(&[], 5).run(request).await.unwrap();
        assert_eq!(h.gateway.uploads()[0].kind, UploadKind::Video);
    }

    #[tokio::test]
    async fn test_make_writes_body_under_first_line_name() {
        let h = Harness::new();
        let request = h.request(
            Operation::Make,
            JobInput::Text {
                text: "hello.py\nprint('hi')\nprint('bye')".into(),
            },
        );

        h.registry(&[], 5).run(request).await.unwrap();

        let made = h.path("hello.py");
        assert_eq!(std::fs::read_to_string(&made).unwrap(), "print('hi')\nprint('bye')");
        let uploads = h.gateway.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].path, made);
        assert_eq!(uploads[0].kind, UploadKind::Document);
    }

    #[tokio::test]
    async fn test_make_rejects_file_input() {
        let h = Harness::new();
        let input = h.input_file("a.txt", "a");
        let err = h
            .registry(&[], 5)
            .run(h.request(Operation::Make, input))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::Failed(_)));
        assert!(h.gateway.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_rename_copies_to_new_name() {
        let h = Harness::new();
        let input = h.input_file("draft.pdf", "pdf bytes");
        let request = h.request(
            Operation::Rename {
                name: "final.pdf".into(),
            },
            input,
        );

        h.registry(&[], 5).run(request).await.unwrap();

        assert_eq!(std::fs::read_to_string(h.path("final.pdf")).unwrap(), "pdf bytes");
        assert_eq!(h.gateway.uploads()[0].path, h.path("final.pdf"));
    }

    #[tokio::test]
    async fn test_rename_to_same_name_keeps_content() {
        let h = Harness::new();
        let input = h.input_file("same.pdf", "pdf bytes");
        let request = h.request(
            Operation::Rename {
                name: "same.pdf".into(),
            },
            input,
        );

        h.registry(&[], 5).run(request).await.unwrap();
        assert_eq!(std::fs::read_to_string(h.path("same.pdf")).unwrap(), "pdf bytes");
    }

    // ── external commands ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_unconfigured_operation_is_unavailable() {
        let h = Harness::new();
        let input = h.input_file("photo.jpg", "jpg");
        let request = h.request(
            Operation::Special {
                op: SpecialOp::Upscale,
            },
            input,
        );

        let err = h.registry(&[], 5).run(request).await.unwrap_err();
        assert_eq!(err.to_string(), "operation 'upscale' is not available");
    }

    #[tokio::test]
    async fn test_convert_uploads_expected_output() {
        let h = Harness::new();
        let input = h.input_file("notes.txt", "# title");
        let request = h.request(
            Operation::Convert {
                from: "txt".into(),
                to: "md".into(),
            },
            input,
        );

        h.registry(&[("convert", "cp {input} {output}")], 5)
            .run(request)
            .await
            .unwrap();

        let uploads = h.gateway.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].path, h.path("notes.md"));
        assert_eq!(std::fs::read_to_string(h.path("notes.md")).unwrap(), "# title");
    }

    #[tokio::test]
    async fn test_text_operation_uploads_new_files() {
        let h = Harness::new();
        let request = h.request(
            Operation::FetchMagnet,
            JobInput::Text {
                text: "magnet:?xt=urn:btih:abc".into(),
            },
        );

        h.registry(&[("fetch_magnet", "touch {dir}/fetched.bin")], 5)
            .run(request)
            .await
            .unwrap();

        let uploads = h.gateway.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].path, h.path("fetched.bin"));
    }

    #[tokio::test]
    async fn test_failing_command_is_failed() {
        let h = Harness::new();
        let input = h.input_file("a.txt", "a");
        let request = h.request(
            Operation::Convert {
                from: "txt".into(),
                to: "pdf".into(),
            },
            input,
        );

        let err = h
            .registry(&[("convert", "false")], 5)
            .run(request)
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::Failed(_)));
        assert!(h.gateway.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_command_without_output_is_failed() {
        let h = Harness::new();
        let input = h.input_file("a.txt", "a");
        let request = h.request(
            Operation::Special {
                op: SpecialOp::Scan,
            },
            input,
        );

        let err = h
            .registry(&[("scan", "true")], 5)
            .run(request)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no output was produced");
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let h = Harness::new();
        let input = h.input_file("a.txt", "a");
        let request = h.request(
            Operation::Special {
                op: SpecialOp::Run,
            },
            input,
        );

        let err = h
            .registry(&[("run", "sleep 10")], 1)
            .run(request)
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::Timeout { secs: 1 }));
    }

    #[test]
    fn test_configured_keys_sorted() {
        let h = Harness::new();
        let registry = h.registry(&[("ocr", "x"), ("convert", "y")], 5);
        assert_eq!(registry.configured(), vec!["convert", "ocr"]);
    }

    // ── helpers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_render_command_substitutes_placeholders() {
        let vars = TemplateVars {
            input: Some(PathBuf::from("/w/in.docx")),
            output: Some(PathBuf::from("/w/in.pdf")),
            ext: "pdf".into(),
            url: String::new(),
            dir: PathBuf::from("/w"),
            name: "in".into(),
        };
        let argv = render_command(
            "soffice --convert-to {ext} --outdir {dir} {input}",
            &vars,
        );
        assert_eq!(
            argv,
            vec!["soffice", "--convert-to", "pdf", "--outdir", "/w", "/w/in.docx"]
        );
        assert_eq!(render_command("cp {input} {output}", &vars)[2], "/w/in.pdf");
    }

    #[test]
    fn test_template_vars_for_text_input() {
        let h = Harness::new();
        let request = h.request(
            Operation::FetchLink,
            JobInput::Text {
                text: " https://t.me/c/1/2 ".into(),
            },
        );
        let vars = TemplateVars::for_request(&request);
        assert_eq!(vars.url, "https://t.me/c/1/2");
        assert!(vars.input.is_none());
        assert!(vars.output.is_none());
    }

    #[test]
    fn test_split_make_text() {
        assert_eq!(
            split_make_text("notes\nline one\nline two"),
            ("notes.txt".to_string(), "line one\nline two".to_string())
        );
        assert_eq!(
            split_make_text("my/notes\nx"),
            ("my_notes.txt".to_string(), "x".to_string())
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("  report final.pdf "), "report final.pdf");
        assert_eq!(sanitize_file_name("a/b\\c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }
}
