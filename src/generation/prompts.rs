//! Prompt templates
//!
//! Each stage asks for a fixed output layout so that the extraction parsers
//! can read the reply back. Heading constants are shared with the parsers.

use std::fmt::Write as _;

pub const PROBLEM_HEADINGS: [&str; 4] = ["문제 배경", "해결하고자 하는 문제", "AI 모델의 역할", "기대 효과"];

pub const DATA_SPEC_HEADINGS: [&str; 4] = [
    "데이터 출처 및 수집 방법",
    "데이터 스키마",
    "주요 전처리 단계",
    "개인정보 및 민감정보 관련 이슈",
];

pub const MODEL_DESIGN_HEADINGS: [&str; 4] = ["모델 이름", "모델 유형", "주요 특징", "하이퍼파라미터"];

pub const TEST_CASE_COLUMNS: [&str; 4] = ["TC_ID", "description", "input", "expected_output"];

const UNDEFINED: &str = "정의되지 않음";

fn or_undefined(value: &str) -> &str {
    if value.trim().is_empty() {
        UNDEFINED
    } else {
        value.trim()
    }
}

fn numbered_headings(headings: &[&str]) -> String {
    let mut out = String::new();
    for (i, heading) in headings.iter().enumerate() {
        let _ = writeln!(out, "### {}. {}\n[여기에 내용 작성]\n", i + 1, heading);
    }
    out
}

pub fn problem_definition(use_case: &str, background: &str, expected_effect: &str) -> String {
    format!(
        "당신은 AI 과제를 기획하는 전문 기획자입니다. 다음 핵심 정보를 바탕으로 체계적인 '문제정의서'를 마크다운 형식으로 작성해 주세요.\n\
         각 항목은 전문적이고 구체적인 내용으로 서술해야 합니다.\n\n\
         - **사용 목적:** {}\n\
         - **도입 배경:** {}\n\
         - **기대 효과:** {}\n\n\
         **요구 형식 (반드시 이 순서와 형식으로 작성):**\n\n{}",
        or_undefined(use_case),
        or_undefined(background),
        or_undefined(expected_effect),
        numbered_headings(&PROBLEM_HEADINGS)
    )
}

/// Turn a planning conversation into the fenced JSON summary the wizard reads
pub fn problem_definition_summary(conversation: &str) -> String {
    format!(
        "당신은 대화 내용을 분석하여 공식 문서로 정리하는 요약 전문가입니다.\n\
         아래 대화 기록을 바탕으로 '문제 정의서'의 각 항목을 채워주세요.\n\
         결과는 반드시 아래의 JSON 형식으로만 응답해야 합니다.\n\n\
         [대화 기록]\n{}\n\n\
         ```json\n\
         {{\n  \"project_name\": \"[프로젝트 이름]\",\n  \"project_goal\": \"[최종 목표]\",\n  \"problem_background\": \"[문제 배경]\",\n  \"expected_output\": \"[구체적인 결과물]\"\n}}\n\
         ```",
        conversation.trim()
    )
}

pub fn data_spec(problem_definition: &str, data_description: &str) -> String {
    format!(
        "당신은 데이터 분석 전문가입니다.\n\
         다음 문제정의서와 데이터 설명을 바탕으로 '데이터 정의서'의 각 항목을 구체적으로 작성해주세요.\n\
         결과는 반드시 아래 형식을 정확히 지켜주세요. 데이터 스키마는 마크다운 테이블을 권장합니다.\n\n\
         [문제정의서]\n{}\n\n\
         **데이터 설명:** {}\n\n---\n{}",
        problem_definition.trim(),
        or_undefined(data_description),
        numbered_headings(&DATA_SPEC_HEADINGS)
    )
}

pub fn model_design(problem_definition: &str, data_spec: Option<&str>) -> String {
    let data_section = match data_spec {
        Some(spec) if !spec.trim().is_empty() => format!("\n[데이터 정의서]\n{}\n", spec.trim()),
        _ => String::new(),
    };
    format!(
        "당신은 시니어 AI 아키텍트입니다.\n\
         아래 문서를 바탕으로 이 프로젝트에 가장 적합한 AI 모델의 사양을 추천해주세요.\n\
         모델 유형은 분류, 회귀, 클러스터링, 자연어 처리, 이미지 인식, 기타 중 하나를 선택하세요.\n\n\
         [문제정의서]\n{}\n{}\n---\n{}",
        problem_definition.trim(),
        data_section,
        numbered_headings(&MODEL_DESIGN_HEADINGS)
    )
}

pub fn test_cases(model_design: &str, scenario: &str) -> String {
    format!(
        "당신은 QA 엔지니어입니다. 아래 모델 설계서를 바탕으로 다음 시나리오에 대한 단위 테스트 케이스를 작성해주세요.\n\n\
         **시나리오:** {}\n\n\
         [모델 설계서]\n{}\n\n\
         결과는 설명 없이 아래 열을 가진 마크다운 테이블 하나로만 응답하세요.\n\n\
         | {} |\n|{}\n",
        or_undefined(scenario),
        model_design.trim(),
        TEST_CASE_COLUMNS.join(" | "),
        "---|".repeat(TEST_CASE_COLUMNS.len())
    )
}

pub fn performance_report(model_design: &str, model_type: &str, metrics: &[(String, f64)]) -> String {
    let mut metric_lines = String::new();
    for (name, value) in metrics {
        let _ = writeln!(metric_lines, "- {}: {:.4}", name, value);
    }
    format!(
        "당신은 데이터 분석 결과를 보고하는 시니어 분석가입니다.\n\
         아래 모델 설계서와 성능 지표를 바탕으로 모델 성능에 대한 종합 평가 리포트를 작성해주세요.\n\n\
         [모델 설계서]\n{}\n\n\
         **모델 유형:** {}\n\
         **성능 지표:**\n{}\n\
         **리포트 형식:**\n\
         1. **총평:** 모델 성능에 대한 전반적인 요약.\n\
         2. **세부 분석:** 각 성능 지표가 비즈니스 관점에서 무엇을 의미하는지 해석.\n\
         3. **결론 및 제언:** 상용화 가능성 및 개선할 점.",
        model_design.trim(),
        or_undefined(model_type),
        metric_lines
    )
}

pub fn trust_report(
    problem_definition: &str,
    fairness: &str,
    explainability: &str,
    robustness: &str,
) -> String {
    format!(
        "당신은 AI 윤리 및 신뢰성 전문가입니다.\n\
         아래 문제정의서와 신뢰성 검증 결과를 바탕으로 이 모델의 'Trustworthy AI' 수준에 대한 종합 평가 리포트를 작성해주세요.\n\n\
         [문제정의서]\n{}\n\n\
         **[신뢰성 검증 결과]**\n\
         - **공정성:** {}\n\
         - **설명가능성:** {}\n\
         - **강건성:** {}\n\n\
         **리포트 형식:**\n\
         1. **총평:** 신뢰성 수준에 대한 전반적인 요약.\n\
         2. **세부 분석:** 각 검증 결과가 실제 서비스에 미칠 영향.\n\
         3. **잠재적 위험 및 권장 사항:** 배포 전후 모니터링 항목과 추가 검토가 필요한 윤리적 이슈.",
        problem_definition.trim(),
        or_undefined(fairness),
        or_undefined(explainability),
        or_undefined(robustness)
    )
}

pub fn governance_report(check_summary: &str, model_context: &str, model_design: Option<&str>) -> String {
    let design = model_design
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(UNDEFINED);
    format!(
        "당신은 AI 거버넌스 감사 담당자입니다.\n\
         아래 자동 점검 결과와 모델 컨텍스트를 바탕으로 종합 리스크 분석 및 권고안을 작성해주세요.\n\
         WARN 항목은 배포를 막지는 않지만 추가 통제가 필요한 사항으로 다루세요.\n\n\
         [자동 점검 결과]\n{}\n\n\
         [모델 컨텍스트 (YAML)]\n{}\n\n\
         [모델 설계서]\n{}\n\n\
         **리포트 형식:**\n\
         1. **점검 요약**\n\
         2. **주요 리스크**\n\
         3. **권고 조치**",
        check_summary.trim(),
        model_context.trim(),
        design
    )
}
