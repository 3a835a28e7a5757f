//! Canonical schema text rendering.
//!
//! The [`Renderer`] serializes a [`ModuleExtraction`] into deterministic
//! `.proto` source:
//!
//! 1. `syntax`, `package` and `option go_package` header lines
//! 2. `import` lines chosen by the [`ImportResolver`]
//! 3. Enums, then messages, then services, each group sorted by name
//!
//! Fields are emitted by ascending number. Enum values and rpc methods keep
//! their declaration order. Blocks are separated by one blank line and the
//! document ends right after the last block.
//!
//! Two renders of the same extraction are byte-identical.

mod imports;

use crate::record::{EnumRecord, MessageRecord, MethodRecord, ModuleExtraction, ServiceRecord};
use std::fmt::Write as FmtWrite;

pub use imports::{FixedImport, ImportResolver, NoImports, BASE_MODULE, TIMESTAMP_IMPORT};

/// Package declared by default
pub const DEFAULT_PACKAGE: &str = "xai_api";

/// `go_package` option emitted by default
pub const DEFAULT_GO_PACKAGE: &str = "github.com/ZaguanLabs/xai-sdk-go/proto/gen/go/xai/v1;xaiv1";

/// Configuration for rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Package declaration; omitted when empty
    pub package: String,
    /// `go_package` option; omitted when empty
    pub go_package: String,
    /// Indentation string (default: 2 spaces)
    pub indent_str: String,
    /// Prefix streaming rpc types with `stream`
    pub mark_streaming: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            go_package: DEFAULT_GO_PACKAGE.to_string(),
            indent_str: "  ".to_string(),
            mark_streaming: false,
        }
    }
}

impl RenderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the package name
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Sets the `go_package` option value
    pub fn go_package(mut self, go_package: impl Into<String>) -> Self {
        self.go_package = go_package.into();
        self
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets whether streaming rpcs are marked
    pub fn mark_streaming(mut self, mark: bool) -> Self {
        self.mark_streaming = mark;
        self
    }
}

/// Renders module extractions as canonical schema text
pub struct Renderer {
    config: RenderConfig,
    imports: Box<dyn ImportResolver>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Creates a renderer with default configuration and [`FixedImport`]
    pub fn new() -> Self {
        Self {
            config: RenderConfig::default(),
            imports: Box::new(FixedImport::default()),
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the import strategy
    pub fn with_imports(mut self, resolver: impl ImportResolver + 'static) -> Self {
        self.imports = Box::new(resolver);
        self
    }

    /// Renders one module's document
    pub fn render(&self, module: &str, extraction: &ModuleExtraction) -> String {
        let mut output = String::new();
        self.write_to(module, extraction, &mut output)
            .expect("String write cannot fail");
        output
    }

    /// Writes one module's document to a writer
    pub fn write_to(
        &self,
        module: &str,
        extraction: &ModuleExtraction,
        w: &mut impl FmtWrite,
    ) -> std::fmt::Result {
        let imports = self.imports.imports(module, extraction);
        let mut writer = CanonicalWriter::new(w, &self.config);
        writer.write_document(extraction, &imports)
    }
}

/// Writes blocks separated by single blank lines
struct CanonicalWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a RenderConfig,
    started: bool,
}

impl<'a, W: FmtWrite> CanonicalWriter<'a, W> {
    fn new(writer: &'a mut W, config: &'a RenderConfig) -> Self {
        Self {
            writer,
            config,
            started: false,
        }
    }

    /// Separates the next block from the previous one
    fn begin_block(&mut self) -> std::fmt::Result {
        if self.started {
            writeln!(self.writer)?;
        }
        self.started = true;
        Ok(())
    }

    fn write_member(&mut self, line: std::fmt::Arguments<'_>) -> std::fmt::Result {
        write!(self.writer, "{}", self.config.indent_str)?;
        self.writer.write_fmt(line)?;
        writeln!(self.writer)
    }

    fn write_document(
        &mut self,
        extraction: &ModuleExtraction,
        imports: &[String],
    ) -> std::fmt::Result {
        self.write_header(imports)?;

        for enum_type in extraction.enums.values() {
            self.write_enum(enum_type)?;
        }
        for message in extraction.messages.values() {
            self.write_message(message)?;
        }
        for service in extraction.services.values() {
            self.write_service(service)?;
        }

        Ok(())
    }

    fn write_header(&mut self, imports: &[String]) -> std::fmt::Result {
        self.begin_block()?;
        writeln!(self.writer, "syntax = \"proto3\";")?;

        if !self.config.package.is_empty() {
            self.begin_block()?;
            writeln!(self.writer, "package {};", self.config.package)?;
        }

        if !self.config.go_package.is_empty() {
            self.begin_block()?;
            writeln!(
                self.writer,
                "option go_package = \"{}\";",
                escape_string(&self.config.go_package)
            )?;
        }

        if !imports.is_empty() {
            self.begin_block()?;
            for import in imports {
                writeln!(self.writer, "import \"{}\";", escape_string(import))?;
            }
        }

        Ok(())
    }

    fn write_enum(&mut self, enum_type: &EnumRecord) -> std::fmt::Result {
        self.begin_block()?;
        writeln!(self.writer, "enum {} {{", enum_type.name)?;
        for value in &enum_type.values {
            self.write_member(format_args!("{} = {};", value.name, value.number))?;
        }
        writeln!(self.writer, "}}")
    }

    fn write_message(&mut self, message: &MessageRecord) -> std::fmt::Result {
        self.begin_block()?;
        writeln!(self.writer, "message {} {{", message.name)?;

        let mut fields: Vec<_> = message.fields.iter().collect();
        fields.sort_by_key(|f| f.number);

        for field in fields {
            let label = if field.repeated { "repeated " } else { "" };
            self.write_member(format_args!(
                "{}{} {} = {};",
                label, field.field_type, field.name, field.number
            ))?;
        }
        writeln!(self.writer, "}}")
    }

    fn write_service(&mut self, service: &ServiceRecord) -> std::fmt::Result {
        self.begin_block()?;
        writeln!(self.writer, "service {} {{", service.name)?;
        for method in &service.methods {
            self.write_method(method)?;
        }
        writeln!(self.writer, "}}")
    }

    fn write_method(&mut self, method: &MethodRecord) -> std::fmt::Result {
        let stream = |streaming: bool| {
            if streaming && self.config.mark_streaming {
                "stream "
            } else {
                ""
            }
        };
        let input = stream(method.client_streaming);
        let output = stream(method.server_streaming);

        self.write_member(format_args!(
            "rpc {}({}{}) returns ({}{});",
            method.name, input, method.input_type_name, output, method.output_type_name
        ))
    }
}

/// Escape a string for proto syntax
fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ if c.is_ascii_control() => {
                result.push_str(&format!("\\x{:02x}", c as u8));
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EnumValueRecord, FieldRecord, FieldType};
    use pretty_assertions::assert_eq;

    fn field(number: u32, name: &str, field_type: FieldType, repeated: bool) -> FieldRecord {
        FieldRecord {
            number,
            name: name.into(),
            field_type,
            repeated,
        }
    }

    fn method(name: &str, input: &str, output: &str) -> MethodRecord {
        MethodRecord {
            name: name.into(),
            input_type_name: input.into(),
            output_type_name: output.into(),
            client_streaming: false,
            server_streaming: false,
        }
    }

    fn ping_extraction() -> ModuleExtraction {
        let mut extraction = ModuleExtraction::default();
        extraction.enums.insert(
            "Status".into(),
            EnumRecord {
                name: "Status".into(),
                values: vec![
                    EnumValueRecord {
                        name: "OK".into(),
                        number: 0,
                    },
                    EnumValueRecord {
                        name: "FAILED".into(),
                        number: 1,
                    },
                ],
            },
        );
        extraction.messages.insert(
            "Ping".into(),
            MessageRecord {
                name: "Ping".into(),
                fields: vec![
                    field(1, "id", FieldType::Scalar("int64"), false),
                    field(2, "tags", FieldType::Scalar("string"), true),
                ],
                ..Default::default()
            },
        );
        extraction.services.insert(
            "Pinger".into(),
            ServiceRecord {
                name: "Pinger".into(),
                methods: vec![method("Send", "Ping", "Ping")],
            },
        );
        extraction
    }

    fn renderer() -> Renderer {
        Renderer::new().with_config(RenderConfig::new().go_package("..."))
    }

    #[test]
    fn test_render_ping_module() {
        let expected = r#"syntax = "proto3";

package xai_api;

option go_package = "...";

import "google/protobuf/timestamp.proto";

enum Status {
  OK = 0;
  FAILED = 1;
}

message Ping {
  int64 id = 1;
  repeated string tags = 2;
}

service Pinger {
  rpc Send(Ping) returns (Ping);
}
"#;
        assert_eq!(renderer().render("ping", &ping_extraction()), expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let extraction = ping_extraction();
        let renderer = renderer();
        assert_eq!(
            renderer.render("chat", &extraction),
            renderer.render("chat", &extraction.clone())
        );
    }

    #[test]
    fn test_empty_module_renders_header_only() {
        let expected = r#"syntax = "proto3";

package xai_api;

option go_package = "...";
"#;
        assert_eq!(
            renderer().render("shared", &ModuleExtraction::default()),
            expected
        );
    }

    #[test]
    fn test_blocks_sorted_by_name() {
        let mut extraction = ModuleExtraction::default();
        for name in ["Zeta", "Alpha", "Mid"] {
            extraction.messages.insert(
                name.into(),
                MessageRecord {
                    name: name.into(),
                    ..Default::default()
                },
            );
            extraction.services.insert(
                format!("{}Service", name),
                ServiceRecord {
                    name: format!("{}Service", name),
                    methods: vec![],
                },
            );
            extraction.enums.insert(
                format!("{}Mode", name),
                EnumRecord {
                    name: format!("{}Mode", name),
                    values: vec![],
                },
            );
        }

        let text = renderer().render("chat", &extraction);
        let alpha_enum = text.find("enum AlphaMode").unwrap();
        let mid_enum = text.find("enum MidMode").unwrap();
        let zeta_enum = text.find("enum ZetaMode").unwrap();
        assert!(alpha_enum < mid_enum && mid_enum < zeta_enum);

        let alpha = text.find("message Alpha").unwrap();
        let mid = text.find("message Mid").unwrap();
        let zeta = text.find("message Zeta").unwrap();
        assert!(zeta_enum < alpha && alpha < mid && mid < zeta);

        let alpha_svc = text.find("service AlphaService").unwrap();
        let zeta_svc = text.find("service ZetaService").unwrap();
        assert!(zeta < alpha_svc && alpha_svc < zeta_svc);
    }

    #[test]
    fn test_fields_rendered_by_number() {
        let mut extraction = ModuleExtraction::default();
        extraction.messages.insert(
            "Usage".into(),
            MessageRecord {
                name: "Usage".into(),
                fields: vec![
                    field(3, "c", FieldType::Unknown(99), false),
                    field(1, "a", FieldType::Named("Status".into()), false),
                    field(2, "b", FieldType::Scalar("uint32"), true),
                ],
                ..Default::default()
            },
        );

        let text = Renderer::new()
            .with_imports(NoImports)
            .with_config(RenderConfig::new().package("").go_package(""))
            .render("usage", &extraction);
        let expected = r#"syntax = "proto3";

message Usage {
  Status a = 1;
  repeated uint32 b = 2;
  type99 c = 3;
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_enum_values_keep_declaration_order() {
        let mut extraction = ModuleExtraction::default();
        extraction.enums.insert(
            "Mode".into(),
            EnumRecord {
                name: "Mode".into(),
                values: vec![
                    EnumValueRecord {
                        name: "B".into(),
                        number: 2,
                    },
                    EnumValueRecord {
                        name: "NEG".into(),
                        number: -1,
                    },
                ],
            },
        );

        let text = renderer().render("shared", &extraction);
        assert!(text.ends_with("enum Mode {\n  B = 2;\n  NEG = -1;\n}\n"));
    }

    #[test]
    fn test_streaming_markers() {
        let mut extraction = ModuleExtraction::default();
        let mut stream = method("Watch", "Request", "Event");
        stream.server_streaming = true;
        extraction.services.insert(
            "Watcher".into(),
            ServiceRecord {
                name: "Watcher".into(),
                methods: vec![stream],
            },
        );

        let plain = renderer().render("shared", &extraction);
        assert!(plain.contains("  rpc Watch(Request) returns (Event);\n"));

        let marked = Renderer::new()
            .with_config(RenderConfig::new().mark_streaming(true))
            .render("shared", &extraction);
        assert!(marked.contains("  rpc Watch(Request) returns (stream Event);\n"));
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("hello"), "hello");
        assert_eq!(escape_string("hello\\world"), "hello\\\\world");
        assert_eq!(escape_string("hello\"world"), "hello\\\"world");
        assert_eq!(escape_string("hello\nworld"), "hello\\nworld");
    }
}
