//! Policy Tables — static mappings from politeness/purpose/intent/preset to
//! Korean style directives and phrase banks. Pure data, no behavior.
//!
//! Directives are selected by exact key; there is no interpolation between
//! politeness levels.

use crate::transform::types::{Intent, Politeness, Purpose, TonePreset};

/// Style rule for a politeness level (sentence length, endings, honorifics).
pub fn politeness_rule(level: Politeness) -> &'static str {
    match level {
        Politeness::Concise => {
            "문체: 간결한 합니다체. 문장당 15~20자. 종결어미: '~합니다/~해주세요/~부탁드립니다' 혼용 허용. 반말/명령형 금지."
        }
        Politeness::Standard => {
            "문체: 표준 비즈니스 합니다체. 완곡 요청('검토 부탁드립니다', '공유드립니다') 사용. 2~4문장 구성."
        }
        Politeness::Deferential => {
            "문체: 정중-신중 합니다체. 주어에 '귀하/고객님/팀' 존칭 사용. 완곡표현+책임어구('죄송합니다', '확인 부탁드립니다') 포함."
        }
    }
}

/// Layout rule for a document purpose (structure + length/bullet budget).
pub fn purpose_layout(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Email => {
            "레이아웃: 인사(1문장) → 요지(1-2문장) → 요청/다음단계(1-2불릿) → 맺음말/서명. 본문 3-6문장, 불릿 최대 4개."
        }
        Purpose::Report => {
            "레이아웃: 개요(1문장) → 사실/데이터(2-4불릿) → 결론/요청(1-2문장). 불릿 최대 4개."
        }
        Purpose::Memo => "레이아웃: 요약(1문장, 200자 이내) → 핵심 불릿(2-3개). 총 200자 이내.",
        Purpose::Messenger => {
            "레이아웃: 1-3문장, 총 120자 이내, 줄바꿈 최대 1회. 간결하고 직접적."
        }
        Purpose::Minutes => {
            "레이아웃: 안건/논의/결정/액션아이템(담당·기한) 헤더 고정, 각 항목 불릿 1-3개."
        }
    }
}

/// Guidance sentence for a communicative intent.
pub fn intent_hint(intent: Intent) -> &'static str {
    match intent {
        Intent::Request => "의도: 명확한 요청. 이유와 필요성을 간결하게 + 구체적 다음단계.",
        Intent::Decline => "의도: 정중한 거절. 명확한 이유 + 실행 가능한 대안 제시.",
        Intent::Rebuttal => "의도: 존중하는 이견 표명. 객관적 근거 + 건설적 제안.",
        Intent::Apology => "의도: 진심 어린 사과 + 구체적 개선 조치.",
        Intent::Persuade => "의도: 수신자 관점에서 이해할 수 있는 논리적 근거.",
        Intent::Notice => "의도: 명확한 정보 전달. 액션 필요시 구체적 안내.",
        Intent::Escalation => "의도: 상황 영향도 + 필요한 구체적 지원 요청.",
    }
}

/// Tone-preset modifier layered on top of the politeness rule.
pub fn tone_preset_rule(preset: TonePreset) -> &'static str {
    match preset {
        TonePreset::Friendly => "완곡한 완충어(가능하시다면/번거로우시겠지만) 소량 허용.",
        TonePreset::Firm => "명확한 기대·기한 제시. 우회적 표현 과용 금지.",
        TonePreset::Cautious => "책임 수용/리스크 언급 명시. 모호한 부분은 [확인 필요]로 처리.",
        TonePreset::Default => "표준 비즈니스 톤 유지.",
    }
}

/// Preferred and avoided phrases for an intent.
#[derive(Debug, Clone)]
pub struct PhraseBank {
    pub prefer: &'static [&'static str],
    pub avoid: &'static [&'static str],
}

pub fn phrase_bank(intent: Intent) -> PhraseBank {
    match intent {
        Intent::Request => PhraseBank {
            prefer: &[
                "공유 부탁드립니다",
                "검토 부탁드립니다",
                "가능하시다면",
                "확인 부탁드립니다",
            ],
            avoid: &["빨리", "당장", "왜", "좀", "지금 당장"],
        },
        Intent::Decline => PhraseBank {
            prefer: &["현 시점에서는 어렵습니다", "대안으로는", "사정으로 인해"],
            avoid: &["못합니다", "안 됩니다", "절대"],
        },
        Intent::Rebuttal => PhraseBank {
            prefer: &["제 이해로는", "근거는 다음과 같습니다", "대안 제안"],
            avoid: &["틀렸습니다", "말이 안 됩니다"],
        },
        Intent::Apology => PhraseBank {
            prefer: &[
                "혼선을 드려 죄송합니다",
                "재발 방지 조치",
                "확인 후 공유드리겠습니다",
            ],
            avoid: &["변명", "책임 전가"],
        },
        Intent::Persuade => PhraseBank {
            prefer: &["수신자 관점에서의 이점", "데이터 근거", "리스크/완화"],
            avoid: &["감정적 호소", "근거 없는 확신"],
        },
        Intent::Notice => PhraseBank {
            prefer: &["변경 사항", "일정/영향", "필요 시 액션"],
            avoid: &["과장 표현", "애매한 시제"],
        },
        Intent::Escalation => PhraseBank {
            prefer: &["영향도", "우선순위 조정", "지원 요청드립니다"],
            avoid: &["책임 추궁", "탓"],
        },
    }
}

/// Length limit reminder injected into the enhanced user prompt.
pub fn purpose_length_limit(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Messenger => "총 120자 이내, 줄바꿈 최대 1회.",
        Purpose::Memo => "200자 이내, 불릿 2-3개.",
        Purpose::Report => "불릿 최대 4개, 결론 1-2문장.",
        _ => "표준 길이 제한.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_politeness_level_maps_to_its_own_rule() {
        let rules = [
            politeness_rule(Politeness::Concise),
            politeness_rule(Politeness::Standard),
            politeness_rule(Politeness::Deferential),
        ];
        assert!(rules[0].contains("간결한 합니다체"));
        assert!(rules[1].contains("표준 비즈니스 합니다체"));
        assert!(rules[2].contains("정중-신중 합니다체"));
        // No two levels share a directive
        assert_ne!(rules[0], rules[1]);
        assert_ne!(rules[1], rules[2]);
        assert_ne!(rules[0], rules[2]);
    }

    #[test]
    fn test_messenger_layout_has_tight_budget() {
        let layout = purpose_layout(Purpose::Messenger);
        assert!(layout.contains("120자"));
        assert!(layout.contains("줄바꿈 최대 1회"));
    }

    #[test]
    fn test_all_purposes_have_distinct_layouts() {
        let purposes = [
            Purpose::Email,
            Purpose::Report,
            Purpose::Memo,
            Purpose::Messenger,
            Purpose::Minutes,
        ];
        for (i, a) in purposes.iter().enumerate() {
            for b in &purposes[i + 1..] {
                assert_ne!(purpose_layout(*a), purpose_layout(*b));
            }
        }
    }

    #[test]
    fn test_request_bank_avoids_pushy_words() {
        let bank = phrase_bank(Intent::Request);
        assert!(bank.avoid.contains(&"빨리"));
        assert!(bank.avoid.contains(&"당장"));
        assert!(bank.prefer.contains(&"검토 부탁드립니다"));
    }

    #[test]
    fn test_apology_bank_prefers_accountability() {
        let bank = phrase_bank(Intent::Apology);
        assert!(bank.prefer.contains(&"재발 방지 조치"));
        assert!(bank.avoid.contains(&"변명"));
    }

    #[test]
    fn test_every_intent_has_nonempty_bank_and_hint() {
        for intent in [
            Intent::Request,
            Intent::Decline,
            Intent::Rebuttal,
            Intent::Apology,
            Intent::Persuade,
            Intent::Notice,
            Intent::Escalation,
        ] {
            let bank = phrase_bank(intent);
            assert!(!bank.prefer.is_empty());
            assert!(!bank.avoid.is_empty());
            assert!(intent_hint(intent).starts_with("의도:"));
        }
    }

    #[test]
    fn test_default_preset_keeps_standard_tone() {
        assert!(tone_preset_rule(TonePreset::Default).contains("표준 비즈니스 톤"));
        assert!(tone_preset_rule(TonePreset::Firm).contains("기한"));
    }

    #[test]
    fn test_length_limits_follow_purpose() {
        assert!(purpose_length_limit(Purpose::Messenger).contains("120자"));
        assert!(purpose_length_limit(Purpose::Memo).contains("200자"));
        assert_eq!(purpose_length_limit(Purpose::Email), "표준 길이 제한.");
    }
}
