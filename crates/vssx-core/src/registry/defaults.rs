//! Built-in field specifications.

use super::{FieldDraft, NodeTest, StructuralHint, TextFilter};
use crate::models::FieldType;

fn cell(label: &str) -> StructuralHint {
    StructuralHint::LabeledCell(label.to_string())
}

fn sibling(label: &str) -> StructuralHint {
    StructuralHint::LabeledSibling(label.to_string())
}

fn attr(name: &str, needle: &str, exact: bool) -> StructuralHint {
    StructuralHint::Attribute {
        name: name.to_string(),
        needle: needle.to_string(),
        exact,
    }
}

pub(super) fn default_fields() -> Vec<FieldDraft> {
    vec![phone(), income(), bank(), household_code(), members()]
}

fn phone() -> FieldDraft {
    FieldDraft::new("phone", FieldType::Phone)
        .known_keys(&["so_dien_thoai", "sdt", "dien_thoai", "phone_number", "mobile"])
        .structural(attr("data-field", "phone", true))
        .structural(cell("điện thoại"))
        .structural(cell("sđt"))
        .structural(sibling("điện thoại"))
        .structural(sibling("sđt"))
        .structural(attr("type", "tel", true))
        .structural(attr("name", "phone", false))
        .structural(attr("class", "phone", false))
        .regex(r"(?i)(?:số\s*điện\s*thoại|điện\s*thoại|sđt|di\s*động|phone|mobile|tel|hotline|liên\s*hệ)[^\d\n+]{0,25}(\+?\d[\d .\-()]{7,16}\d)")
        .regex(r"(?:\+84|\b84|\b0)[1-9](?:[ .\-]?\d){7,9}\b")
        .keywords(&["điện thoại", "sđt", "di động", "phone", "mobile", "liên hệ", "hotline"])
        .path(NodeTest::class("contact"), TextFilter::MinDigits(9))
        .path(NodeTest::class("phone"), TextFilter::MinDigits(9))
        .fallback(r"\b\d{10,11}\b")
        .fallback(r"\+?\d[\d .\-()]{8,14}\d")
}

fn income() -> FieldDraft {
    FieldDraft::new("income", FieldType::Currency)
        .known_keys(&["thu_nhap", "luong", "salary", "monthly_income"])
        .structural(attr("data-field", "income", true))
        .structural(cell("thu nhập"))
        .structural(cell("lương"))
        .structural(sibling("thu nhập"))
        .structural(sibling("lương"))
        .structural(attr("name", "income", false))
        .structural(attr("class", "salary", false))
        .structural(attr("class", "income", false))
        .regex(r"(?i)(?:thu\s*nhập|lương|income|salary)[^\d\n]{0,30}?(\d[\d.,]*(?:\s*(?:triệu|nghìn|ngàn|tỷ|million|thousand|billion|k)\b)?(?:\s*(?:VND|VNĐ|đồng|đ)\b)?)")
        .regex(r"(?i)(\d{1,3}(?:[.,]\d{3})+\s*(?:VND|VNĐ|đồng|đ)\b)")
        .regex(r"(?i)(\d+(?:[.,]\d+)?\s*(?:triệu|tỷ|million|billion)\b)")
        .keywords(&["thu nhập", "mức lương", "lương", "income", "salary"])
        .path(NodeTest::class("income"), TextFilter::MinDigits(2))
        .path(NodeTest::class("salary"), TextFilter::MinDigits(2))
        .fallback(r"\d{1,3}(?:[.,]\d{3}){2,}")
        .fallback(r"(?i)\d+(?:[.,]\d+)?\s*triệu")
}

fn bank() -> FieldDraft {
    FieldDraft::new("bank", FieldType::BankReference)
        .known_keys(&["ngan_hang", "bank_name", "bank_code"])
        .structural(attr("data-field", "bank", true))
        .structural(cell("ngân hàng"))
        .structural(sibling("ngân hàng"))
        .structural(sibling("nh:"))
        .structural(attr("name", "bank", false))
        .structural(attr("class", "bank-name", false))
        .regex(r"(?i)(?:ngân\s*hàng|bank)[^:\n\t]{0,25}:[ \t]*([^\n\t|,;]{2,60})")
        .regex(r"\b(VCB|TCB|CTG|BID|MBB|VPB|ACB|SHB|EIB|OCB|TPB|HDB|VIB|SSB|STB|AGR|LPB)\b")
        .regex(r"(?i)\b(Vietcombank|Techcombank|VietinBank|BIDV|MB\s*Bank|VPBank|Sacombank|Agribank|Eximbank|TPBank|HDBank|SeABank)\b")
        .keywords(&["ngân hàng", "tên nh", "mã nh", "bank"])
        .path(NodeTest::class("bank"), TextFilter::MinChars(3))
        .fallback(r"(?i)\b\w+bank\b")
}

fn household_code() -> FieldDraft {
    FieldDraft::new("household_code", FieldType::AlphanumericCode)
        .known_keys(&["ma_ho", "ma_ho_gia_dinh", "hgd", "household_id"])
        .structural(attr("data-field", "household_code", true))
        .structural(cell("mã hộ"))
        .structural(cell("hộ gia đình"))
        .structural(sibling("mã hộ"))
        .structural(sibling("hộ gia đình"))
        .structural(sibling("mã hgđ"))
        .structural(attr("name", "household", false))
        .structural(attr("class", "household-code", false))
        .regex(r"(?i)(?:mã\s*hộ(?:\s*gia\s*đình)?|mã\s*hgđ|hộ\s*gia\s*đình|household(?:\s*code)?|hh\s*code)[^\p{L}\d\n]{0,5}([A-Za-z]{2,4}[ ]?\d{5,12}|[A-Za-z0-9]{8,15})")
        .regex(r"(?i)\b(HGD[ ]?[0-9A-Z]{5,12})\b")
        .regex(r"\b([A-Z]{2,3}\d{6,12})\b")
        .keywords(&["mã hộ", "hộ gia đình", "mã hgđ", "household"])
        .path(NodeTest::class("household"), TextFilter::MinDigits(5))
        .path(NodeTest::class("hgd"), TextFilter::MinDigits(5))
        .fallback(r"\b[A-Z]{1,4}\d{6,14}\b")
        .fallback(r"\b[A-Z0-9]{8,15}\b")
}

fn members() -> FieldDraft {
    FieldDraft::new("members", FieldType::StructuredList)
        .known_keys(&["thanh_vien", "thong_tin_thanh_vien", "family", "family_members"])
        .structural(attr("data-field", "members", true))
        .structural(StructuralHint::TableRows {
            keyword: "quan hệ".to_string(),
        })
        .structural(StructuralHint::TableRows {
            keyword: "thành viên".to_string(),
        })
        .structural(StructuralHint::ContainerItems {
            class_needle: "member".to_string(),
        })
        .structural(StructuralHint::ContainerItems {
            class_needle: "family".to_string(),
        })
        .regex(r"(?im)(?:thành\s*viên|gia\s*đình|nhân\s*khẩu)[^:\n]{0,30}:\s*(.+)$")
        .regex(r"[\p{Lu}][\p{L} ]+?\s*-\s*(?:Vợ|Chồng|Con|Cha|Mẹ|Anh|Chị|Em)\s*-\s*\d{4}")
        .regex(r"(?:Vợ|Chồng|Con|Cha|Mẹ|Anh|Chị|Em)\s*:\s*[\p{Lu}][\p{L} ]+(?:\(\d{4}\))?")
        .keywords(&["thành viên", "gia đình", "nhân khẩu", "members"])
        .path(NodeTest::class("famil"), TextFilter::HasYear)
        .path(NodeTest::tag_with_text("div", "thành viên"), TextFilter::HasYear)
        .fallback(r"(?:Con|Vợ|Chồng|Cha|Mẹ)[^,\n<>]+")
}
