//! Complex fields (`w:fldChar` / `w:instrText`)
//!
//! A field is a directive whose displayed value is computed. The library keeps
//! a cached result so that consumers show something sensible before updating
//! fields; values that depend on pagination get fixed placeholders.

use chrono::{Local, NaiveDateTime};

use crate::error::{DocxError, Result};

/// Kind of directive a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Toc,
    PageNumber,
    PageCount,
    Date,
    Time,
    StyleRef,
    Seq,
    Ref,
    Hyperlink,
    Custom,
}

impl FieldType {
    /// Classify a field code by its leading keyword
    pub fn from_code(code: &str) -> Self {
        let keyword = code
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match keyword.as_str() {
            "TOC" => Self::Toc,
            "PAGE" => Self::PageNumber,
            "NUMPAGES" => Self::PageCount,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "STYLEREF" => Self::StyleRef,
            "SEQ" => Self::Seq,
            "REF" => Self::Ref,
            "HYPERLINK" => Self::Hyperlink,
            _ => Self::Custom,
        }
    }
}

/// A field instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    id: String,
    field_type: FieldType,
    code: String,
    result: String,
    dirty: bool,
}

const TOC_PLACEHOLDER: &str = "Right-click to update table of contents.";
const DEFAULT_DATE_PICTURE: &str = "M/d/yyyy";
const DEFAULT_TIME_PICTURE: &str = "h:mm AM/PM";

impl Field {
    /// Field from a raw code; the type is inferred from its keyword
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DocxError::validation("field_code", "field code must not be empty"));
        }
        let mut field = Self {
            id: String::new(),
            field_type: FieldType::from_code(&code),
            code,
            result: String::new(),
            dirty: false,
        };
        field.update();
        Ok(field)
    }

    fn typed(field_type: FieldType, code: String) -> Self {
        let mut field = Self {
            id: String::new(),
            field_type,
            code,
            result: String::new(),
            dirty: false,
        };
        field.update();
        field
    }

    /// `PAGE`
    pub fn page_number() -> Self {
        Self::typed(FieldType::PageNumber, "PAGE".into())
    }

    /// `NUMPAGES`
    pub fn page_count() -> Self {
        Self::typed(FieldType::PageCount, "NUMPAGES".into())
    }

    /// `TOC \o "1-<levels>" \h \z \u`; levels are clamped by Word to 1..=9
    pub fn table_of_contents(levels: u8) -> Result<Self> {
        if !(1..=9).contains(&levels) {
            return Err(DocxError::validation(
                "toc_levels",
                format!("{levels} is outside 1..=9"),
            ));
        }
        let mut field = Self::typed(
            FieldType::Toc,
            format!(r#"TOC \o "1-{levels}" \h \z \u"#),
        );
        field.dirty = true;
        Ok(field)
    }

    /// `DATE \@ "<picture>"`, e.g. `"yyyy-MM-dd"`
    pub fn date(picture: &str) -> Self {
        Self::typed(FieldType::Date, format!(r#"DATE \@ "{picture}""#))
    }

    /// `TIME \@ "<picture>"`, e.g. `"HH:mm"`
    pub fn time(picture: &str) -> Self {
        Self::typed(FieldType::Time, format!(r#"TIME \@ "{picture}""#))
    }

    /// `STYLEREF "<style>"`
    pub fn style_ref(style: &str) -> Self {
        Self::typed(FieldType::StyleRef, format!(r#"STYLEREF "{style}""#))
    }

    /// `SEQ <identifier> \* ARABIC` (figure/table numbering)
    pub fn sequence(identifier: &str) -> Self {
        Self::typed(FieldType::Seq, format!(r"SEQ {identifier} \* ARABIC"))
    }

    /// `REF <bookmark> \h`
    pub fn reference(bookmark: &str) -> Self {
        Self::typed(FieldType::Ref, format!(r"REF {bookmark} \h"))
    }

    /// `HYPERLINK "<url>"`
    pub fn hyperlink(url: &str) -> Self {
        Self::typed(FieldType::Hyperlink, format!(r#"HYPERLINK "{url}""#))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Replace the code, reclassifying the field and marking it dirty
    pub fn set_code(&mut self, code: impl Into<String>) -> Result<()> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DocxError::validation("field_code", "field code must not be empty"));
        }
        self.field_type = FieldType::from_code(&code);
        self.code = code;
        self.dirty = true;
        Ok(())
    }

    /// Cached display value
    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn set_result(&mut self, result: impl Into<String>) {
        self.result = result.into();
    }

    /// Whether consumers should recompute the field on open
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Recompute the cached result using the current local time
    pub fn update(&mut self) {
        self.update_at(Local::now().naive_local());
    }

    /// Recompute the cached result as of `now`
    ///
    /// Page numbers and counts are placeholders; they are only known after
    /// layout. Reference-like fields keep their previous result.
    pub fn update_at(&mut self, now: NaiveDateTime) {
        let result = match self.field_type {
            FieldType::PageNumber | FieldType::PageCount | FieldType::Seq => Some("1".to_string()),
            FieldType::Toc => Some(TOC_PLACEHOLDER.to_string()),
            FieldType::Date => {
                let picture = picture_switch(&self.code).unwrap_or(DEFAULT_DATE_PICTURE);
                Some(now.format(&chrono_pattern(picture)).to_string())
            }
            FieldType::Time => {
                let picture = picture_switch(&self.code).unwrap_or(DEFAULT_TIME_PICTURE);
                Some(now.format(&chrono_pattern(picture)).to_string())
            }
            FieldType::Hyperlink => first_quoted(&self.code).map(str::to_string),
            FieldType::StyleRef | FieldType::Ref | FieldType::Custom => None,
        };
        if let Some(result) = result {
            self.result = result;
        }
        if self.field_type != FieldType::Toc {
            self.dirty = false;
        }
    }
}

/// The quoted argument of a `\@` switch
fn picture_switch(code: &str) -> Option<&str> {
    let (_, rest) = code.split_once(r"\@")?;
    first_quoted(rest)
}

fn first_quoted(text: &str) -> Option<&str> {
    let start = text.find('"')? + 1;
    let len = text[start..].find('"')?;
    Some(&text[start..start + len])
}

/// Translate a Word date/time picture into a chrono format string
fn chrono_pattern(picture: &str) -> String {
    let chars: Vec<char> = picture.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let rest = &picture[char_offset(&chars, i)..];
        if rest.get(..5).is_some_and(|marker| marker.eq_ignore_ascii_case("am/pm")) {
            // the case of the leading letter picks the case of the output
            out.push_str(if chars[i].is_ascii_lowercase() { "%P" } else { "%p" });
            i += 5;
            continue;
        }
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let token = match (c, run) {
            ('y', n) if n >= 3 => Some("%Y"),
            ('y', _) => Some("%y"),
            ('M', n) if n >= 4 => Some("%B"),
            ('M', 3) => Some("%b"),
            ('M', 2) => Some("%m"),
            ('M', _) => Some("%-m"),
            ('d', n) if n >= 4 => Some("%A"),
            ('d', 3) => Some("%a"),
            ('d', 2) => Some("%d"),
            ('d', _) => Some("%-d"),
            ('H', 2) => Some("%H"),
            ('H', _) => Some("%-H"),
            ('h', 2) => Some("%I"),
            ('h', _) => Some("%-I"),
            ('m', _) => Some("%M"),
            ('s', _) => Some("%S"),
            _ => None,
        };
        match token {
            Some(token) => out.push_str(token),
            None => {
                for _ in 0..run {
                    if c == '%' {
                        out.push_str("%%");
                    } else {
                        out.push(c);
                    }
                }
            }
        }
        i += run;
    }
    out
}

fn char_offset(chars: &[char], index: usize) -> usize {
    chars[..index].iter().map(|c| c.len_utf8()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn test_type_from_code() {
        assert_eq!(FieldType::from_code(" page \\* MERGEFORMAT"), FieldType::PageNumber);
        assert_eq!(FieldType::from_code("NUMPAGES"), FieldType::PageCount);
        assert_eq!(FieldType::from_code("AUTHOR"), FieldType::Custom);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Field::page_number().result(), "1");
        assert_eq!(Field::page_count().code(), "NUMPAGES");
        let toc = Field::table_of_contents(3).unwrap();
        assert_eq!(toc.code(), r#"TOC \o "1-3" \h \z \u"#);
        assert!(toc.is_dirty());
        assert!(Field::table_of_contents(0).is_err());
    }

    #[test]
    fn test_date_and_time_update() {
        let mut date = Field::date("yyyy-MM-dd");
        date.update_at(at());
        assert_eq!(date.result(), "2024-03-07");

        let mut long = Field::date("dddd, MMMM d, yyyy");
        long.update_at(at());
        assert_eq!(long.result(), "Thursday, March 7, 2024");

        let mut time = Field::time("HH:mm:ss");
        time.update_at(at());
        assert_eq!(time.result(), "14:05:09");

        let mut twelve = Field::time("h:mm AM/PM");
        twelve.update_at(at());
        assert_eq!(twelve.result(), "2:05 PM");
    }

    #[test]
    fn test_am_pm_marker_any_case() {
        let mut lower = Field::new(r#"TIME \@ "h:mm am/pm""#).unwrap();
        lower.update_at(at());
        assert_eq!(lower.result(), "2:05 pm");

        let mut mixed = Field::time("hh:mm Am/Pm");
        mixed.update_at(at());
        assert_eq!(mixed.result(), "02:05 PM");
    }

    #[test]
    fn test_update_is_deterministic() {
        let mut a = Field::date("d/M/yy");
        let mut b = Field::date("d/M/yy");
        a.update_at(at());
        b.update_at(at());
        assert_eq!(a.result(), b.result());
        assert_eq!(a.result(), "7/3/24");
    }

    #[test]
    fn test_set_code_marks_dirty() {
        let mut field = Field::page_number();
        field.set_code("NUMPAGES").unwrap();
        assert_eq!(field.field_type(), FieldType::PageCount);
        assert!(field.is_dirty());
        field.update_at(at());
        assert!(!field.is_dirty());
        assert!(field.set_code("  ").is_err());
    }

    #[test]
    fn test_reference_fields_keep_result() {
        let mut field = Field::reference("bm1");
        field.set_result("Section 2");
        field.update_at(at());
        assert_eq!(field.result(), "Section 2");

        let link = Field::hyperlink("https://example.com");
        assert_eq!(link.result(), "https://example.com");
    }
}
