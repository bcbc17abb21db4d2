//! User-facing message text.

use crate::channels::OutboundMessage;
use crate::config::Keywords;
use crate::dataset::Record;
use crate::matching::codes::{NO_LABEL, YES_LABEL};
use crate::matching::{CodeTable, RentBuckets, WILDCARD};
use crate::session::Question;

const AREA_SUGGESTIONS: [&str; 5] = ["東區", "北區", "香山", "竹北", "寶山"];
const HOUSE_TYPES: [&str; 3] = ["套房", "雅房", "整層住家"];
const NOT_PROVIDED: &str = "未提供";

/// The prompt for a question, with its quick-reply options.
pub fn question(question: Question, buckets: &RentBuckets) -> OutboundMessage {
    let yes_no = [YES_LABEL, NO_LABEL, WILDCARD];
    match question {
        Question::Area => OutboundMessage::quick_reply(
            "想找哪一區的房子呢？也可以直接輸入地名。",
            AREA_SUGGESTIONS.iter().copied().chain([WILDCARD]),
        ),
        Question::Rent => OutboundMessage::quick_reply(
            "每月租金預算大概多少？",
            buckets.labels().chain([WILDCARD]),
        ),
        Question::HouseType => OutboundMessage::quick_reply(
            "想找哪一種房型？",
            HOUSE_TYPES.iter().copied().chain([WILDCARD]),
        ),
        Question::Internet => OutboundMessage::quick_reply("需要有網路嗎？", yes_no),
        Question::Water => OutboundMessage::quick_reply("房租需要包含水費嗎？", yes_no),
        Question::Electricity => {
            OutboundMessage::quick_reply("房租需要包含電費嗎？", yes_no)
        }
    }
}

pub fn greeting(keywords: &Keywords) -> OutboundMessage {
    OutboundMessage::text(format!(
        "好的，我們開始找房子吧！過程中輸入「{}」可以從頭來過，輸入「{}」可以離開。",
        keywords.reset, keywords.stop
    ))
}

pub fn reminder(keywords: &Keywords) -> OutboundMessage {
    OutboundMessage::quick_reply(
        format!("嗨！想找房子的話，請輸入「{}」。", keywords.start),
        [keywords.start.as_str()],
    )
}

pub fn restarted() -> OutboundMessage {
    OutboundMessage::text("沒問題，我們重新開始。")
}

pub fn stopped(keywords: &Keywords) -> OutboundMessage {
    OutboundMessage::text(format!(
        "已結束這次搜尋。想再找房子時，輸入「{}」就可以囉。",
        keywords.start
    ))
}

pub fn searching() -> OutboundMessage {
    OutboundMessage::text("收到！正在幫你找符合條件的房子，請稍等一下…")
}

pub fn still_searching() -> OutboundMessage {
    OutboundMessage::text("還在搜尋中，請再稍等一下。")
}

pub fn text_only() -> OutboundMessage {
    OutboundMessage::text("目前只看得懂文字訊息喔，請用文字回覆。")
}

pub fn fetch_failed(keywords: &Keywords) -> OutboundMessage {
    OutboundMessage::text(format!(
        "抱歉，現在拿不到房屋資料，請稍後輸入「{}」再試一次。",
        keywords.start
    ))
}

pub fn no_more_results(keywords: &Keywords) -> OutboundMessage {
    OutboundMessage::text(format!(
        "沒有更多符合條件的房子了。輸入「{}」可以換個條件再找。",
        keywords.start
    ))
}

pub fn closing() -> OutboundMessage {
    OutboundMessage::text("謝謝使用，祝你早日找到理想的房子！")
}

/// One listing as a burst: title, details, contact/location, then the
/// continue prompt.
pub fn listing(record: &Record, codes: &CodeTable, keywords: &Keywords) -> Vec<OutboundMessage> {
    let amenity = |code: &str| codes.translate(code).unwrap_or(NOT_PROVIDED).to_string();

    let title = OutboundMessage::text(format!(
        "🏠 {}\n租金：{}",
        or_not_provided(&record.title),
        or_not_provided(&record.rent)
    ));

    let mut detail = format!(
        "地區：{}\n房型：{}\n網路：{}\n含水費：{}\n含電費：{}",
        or_not_provided(&record.district),
        or_not_provided(&record.house_type),
        amenity(&record.internet),
        amenity(&record.water),
        amenity(&record.electricity),
    );
    if !record.description.trim().is_empty() {
        detail.push_str("\n\n");
        detail.push_str(record.description.trim());
    }

    let contact = format!(
        "聯絡人：{} {}\n地址：{}",
        or_not_provided(&record.contact),
        record.phone,
        or_not_provided(&record.address)
    );
    let contact = if record.url.trim().is_empty() {
        OutboundMessage::text(contact)
    } else {
        OutboundMessage::link(contact, "查看詳情", record.url.trim())
    };

    vec![
        title,
        OutboundMessage::text(detail),
        contact,
        OutboundMessage::quick_reply(
            "要看下一筆嗎？",
            [keywords.next.as_str(), keywords.done.as_str()],
        ),
    ]
}

fn or_not_provided(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() { NOT_PROVIDED } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_question_offers_the_wildcard() {
        let buckets = RentBuckets::standard();
        for q in Question::ALL {
            match question(q, &buckets) {
                OutboundMessage::QuickReply { options, .. } => {
                    assert_eq!(options.last().map(String::as_str), Some(WILDCARD));
                }
                other => panic!("expected quick reply for {q:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rent_options_follow_buckets() {
        let OutboundMessage::QuickReply { options, .. } =
            question(Question::Rent, &RentBuckets::standard())
        else {
            panic!("expected quick reply");
        };
        assert_eq!(
            options,
            vec!["小於3000", "3000-4000", "4000-5000", "5000以上", WILDCARD]
        );
    }

    #[test]
    fn listing_ends_with_continue_prompt() {
        let record = Record {
            title: "近清大雅房".into(),
            rent: "3200".into(),
            internet: "T".into(),
            water: "F".into(),
            url: "https://rent.example/1".into(),
            ..Record::default()
        };
        let messages = listing(&record, &CodeTable::standard(), &Keywords::default());
        assert_eq!(messages.len(), 4);
        assert!(messages[0].body().contains("近清大雅房"));
        assert!(messages[1].body().contains("網路：是"));
        assert!(messages[1].body().contains("含水費：否"));
        assert!(messages[1].body().contains("含電費：未提供"));
        assert!(matches!(messages[2], OutboundMessage::Link { ref url, .. } if url == "https://rent.example/1"));
        assert_eq!(
            messages[3],
            OutboundMessage::quick_reply("要看下一筆嗎？", ["繼續", "不用了"])
        );
    }

    #[test]
    fn listing_without_url_uses_plain_contact() {
        let messages = listing(&Record::default(), &CodeTable::standard(), &Keywords::default());
        assert!(matches!(messages[2], OutboundMessage::Text { .. }));
        assert!(messages[0].body().contains(NOT_PROVIDED));
    }
}
